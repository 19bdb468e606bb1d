//! The fixed set of category labels an item may carry.
//!
//! Labels are the user-facing strings shown in the browser client, so they
//! are kept verbatim. Some labels contain commas; always join with
//! [`prompt_list`] rather than splitting a flat string.

/// Fallback label for anything outside the enumeration.
pub const OTHER: &str = "Другое";

pub const CATEGORIES: &[&str] = &[
    "Административное право",
    "Агрохимия и агропочвоведение",
    "Английский язык",
    "Актерское мастерство",
    "Автоматика и управление",
    "Авиационная и ракетно-космическая техника",
    "Автоматизация технологических процессов",
    "Анализ хозяйственной деятельности",
    "Антикризисное управление",
    "Архитектура и строительство",
    "Археология",
    "Астрономия",
    "Базы данных",
    "Безопасность жизнедеятельности",
    "Биотехнология",
    "Библиотечно-информационная деятельность",
    "Бизнес-планирование",
    "Бухгалтерский учет и аудит",
    "Банковское дело",
    "Биология",
    "Водные биоресурсы и аквакультура",
    "Военное дело",
    "Ветеринария",
    "Воспроизводство и переработка лесных ресурсов",
    "Внешнеэкономическая деятельность",
    "Высшая математика",
    "Геометрия",
    "Гидравлика",
    "Геодезия",
    "Гостиничное дело",
    "Государственное и муниципальное управление",
    "Геология",
    "География",
    "Гражданское право",
    "Другое",
    "Детали машин",
    "Документоведение и архивоведение",
    "Деньги",
    "Деловой этикет",
    "Дизайн",
    "Естествознание",
    "Жилищное право",
    "Железнодорожный транспорт",
    "Журналистика",
    "Земельное право",
    "Испанский язык",
    "Инженерные сети и оборудование",
    "Инновационный менеджмент",
    "Инвестиции",
    "Информационная безопасность",
    "Информационные технологии",
    "Издательское дело",
    "Информатика",
    "История",
    "Искусство",
    "Конституционное право",
    "Кулинария",
    "Краеведение",
    "Криминалистика",
    "Конфликтология",
    "Кредит",
    "Культурология",
    "Логика",
    "Логистика",
    "Литература",
    "Муниципальное право",
    "Международное право",
    "Микропроцессорная техника",
    "Метрология",
    "Менеджмент организации",
    "Металлургия",
    "Музыка",
    "Микро-, макроэкономика",
    "Менеджмент",
    "Маркетинг",
    "Механика",
    "Машиностроение",
    "Материаловедение",
    "Медицина",
    "Международные отношения",
    "Налоговое право",
    "Нефтегазовое дело",
    "Наноинженерия",
    "Налоги",
    "Организационное развитие",
    "Пожарная безопасность",
    "Природообустройство и водопользование",
    "Приборостроение и оптотехника",
    "Промышленный маркетинг и менеджмент",
    "Производственный маркетинг и менеджмент",
    "Процессы и аппараты",
    "Программирование",
    "Право и юриспруденция",
    "Психология",
    "Политология",
    "Педагогика",
    "Рынок ценных бумаг",
    "Русский язык",
    "Религия",
    "Радиофизика",
    "Режиссура",
    "Работа на компьютере",
    "Реклама и PR",
    "Семейное право",
    "Сопротивление материалов",
    "Связи с общественностью",
    "Социальная работа",
    "Сельское и рыбное хозяйство",
    "Стратегический менеджмент",
    "Страхование",
    "Статистика",
    "Стандартизация",
    "Страноведение",
    "Социология",
    "Трудовое право",
    "Теория государства и права (ТГП)",
    "Таможенное право",
    "Текстильная промышленность",
    "Теория вероятностей",
    "Теоретическая механика",
    "Теория управления",
    "Технология продовольственных продуктов и товаров",
    "Технологические машины и оборудование",
    "Теплоэнергетика и теплотехника",
    "Туризм",
    "Товароведение",
    "Таможенное дело",
    "Торговое дело",
    "Теория машин и механизмов",
    "Транспортные средства",
    "Уголовный процесс",
    "Уголовное право",
    "Управление качеством",
    "Управление проектами",
    "Управление персоналом",
    "Финансовое право",
    "Фармация",
    "Финансовый менеджмент",
    "Физическая культура",
    "Финансы",
    "Философия",
    "Физика",
    "Хирургия",
    "Химия",
    "Ценообразование и оценка бизнеса",
    "Черчение",
    "Экологическое право",
    "Эконометрика",
    "Экономический анализ",
    "Экономическая теория",
    "Экономика предприятия",
    "Энергетическое машиностроение",
    "Экономика труда",
    "Этика",
    "Экономика",
    "Электроника, электротехника, радиотехника",
    "Экология",
    "Ядерные физика и технологии",
    "Ядерная энергетика и теплофизика",
    "Языки (переводы)",
    "Языкознание и филология",
];

/// Whether `label` is one of the known categories (exact match after trim).
pub fn is_known(label: &str) -> bool {
    let label = label.trim();
    CATEGORIES.iter().any(|c| *c == label)
}

/// Map a reply's category onto the enumeration, falling back to [`OTHER`].
pub fn normalize(label: &str) -> String {
    let trimmed = label.trim();
    if is_known(trimmed) {
        trimmed.to_string()
    } else {
        OTHER.to_string()
    }
}

/// The enumeration as a single comma-separated line for prompt embedding.
pub fn prompt_list() -> String {
    CATEGORIES.join(", ")
}
