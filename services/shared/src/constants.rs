/// Shared constants for the bolavila property-management services
///
/// Table names, status labels and default checklists live here so that the
/// HTTP layer, the sync job and the tests agree on the exact strings stored
/// in the database. Labels are Hebrew because that is what the clients
/// display and filter on.

// Tables
pub const TABLE_USERS: &str = "users";
pub const TABLE_ORDERS: &str = "orders";
pub const TABLE_INSPECTIONS: &str = "inspections";
pub const TABLE_INSPECTION_TASKS: &str = "inspection_tasks";
pub const TABLE_CLEANING_INSPECTIONS: &str = "cleaning_inspections";
pub const TABLE_CLEANING_INSPECTION_TASKS: &str = "cleaning_inspection_tasks";
pub const TABLE_INVENTORY_ITEMS: &str = "inventory_items";
pub const TABLE_INVENTORY_ORDERS: &str = "inventory_orders";
pub const TABLE_INVENTORY_ORDER_ITEMS: &str = "inventory_order_items";
pub const TABLE_WAREHOUSES: &str = "warehouses";
pub const TABLE_WAREHOUSE_ITEMS: &str = "warehouse_items";
pub const TABLE_MAINTENANCE_TASKS: &str = "maintenance_tasks";
pub const TABLE_INVOICES: &str = "invoices";
pub const TABLE_EXPENSES: &str = "expenses";
pub const TABLE_CHAT_MESSAGES: &str = "chat_messages";
pub const TABLE_ATTENDANCE_LOGS: &str = "attendance_logs";
pub const TABLE_CLEANING_SCHEDULE: &str = "cleaning_schedule";

/// Every table the service touches, used to seed the in-memory store.
pub const ALL_TABLES: &[&str] = &[
    TABLE_USERS,
    TABLE_ORDERS,
    TABLE_INSPECTIONS,
    TABLE_INSPECTION_TASKS,
    TABLE_CLEANING_INSPECTIONS,
    TABLE_CLEANING_INSPECTION_TASKS,
    TABLE_INVENTORY_ITEMS,
    TABLE_INVENTORY_ORDERS,
    TABLE_INVENTORY_ORDER_ITEMS,
    TABLE_WAREHOUSES,
    TABLE_WAREHOUSE_ITEMS,
    TABLE_MAINTENANCE_TASKS,
    TABLE_INVOICES,
    TABLE_EXPENSES,
    TABLE_CHAT_MESSAGES,
    TABLE_ATTENDANCE_LOGS,
    TABLE_CLEANING_SCHEDULE,
];

// Order statuses
pub const ORDER_STATUS_NEW: &str = "חדש";
pub const ORDER_STATUS_CANCELLED: &str = "בוטל";

/// Payment method used until the office records the real one.
pub const PAYMENT_METHOD_UNDECIDED: &str = "טרם נקבע";

// Inventory orders
pub const INVENTORY_ORDER_STATUS_PENDING: &str = "ממתין לאישור";
pub const INVENTORY_ORDER_TYPE_GENERAL: &str = "הזמנה כללית";

// Maintenance
pub const MAINTENANCE_STATUS_OPEN: &str = "פתוח";
pub const MAINTENANCE_PRIORITY_MEDIUM: &str = "בינוני";

// Invoices
pub const DEFAULT_CURRENCY: &str = "ILS";

/// Only this many characters of an upstream error body reach the client.
pub const UPSTREAM_ERROR_BODY_LIMIT: usize = 200;

/// Chat and attendance listings are capped to the newest rows.
pub const RECENT_ROWS_LIMIT: usize = 50;

/// Default checklist for an exit inspection, in display order.
pub const DEFAULT_EXIT_TASKS: &[&str] = &[
    // pool
    "לשים כלור בבריכה",
    "להוסיף מים בבריכה",
    "לנקות רובוט ולהפעיל",
    "לנקות רשת פנים המנוע",
    "לעשות בקווש שטיפה לפילטר",
    "לטאטא הבק מהמדרגות ומשטחי רביצה",
    // jacuzzi
    "לשים כלור בגקוזי",
    "להוסיף מים בגקוזי",
    "לנקות רובוט גקוזי ולהפעיל",
    "לנקות רשת פנים המנוע גקוזי",
    "לעשות בקווש שטיפה לפילטר גקוזי",
    "לטאטא הבק מהמדרגות ומשטחי רביצה גקוזי",
    // cleaning
    "ניקיון חדרים",
    "ניקיון מטבח",
    "ניקיון שירותים",
    "פינוי זבל לפח אשפה פנים וחוץ הוילה",
    // checks
    "בדיקת מכשירים",
    "בדיקת מצב ריהוט",
    "החלפת מצעים",
    "החלפת מגבות",
    "בדיקת מלאי",
    "לבדוק תקינות חדרים",
    // lock up
    "כיבוי אורות פנים וחוץ הוילה",
    "לנעול דלת ראשית",
];

/// Default checklist for a cleaning inspection, in display order.
pub const DEFAULT_CLEANING_TASKS: &[&str] = &[
    // kitchen
    "מכונת קפה, לנקות ולהחליף פילטר קפה",
    "קפה תה סוכר וכו׳",
    "להעביר סמרטוט במתקן מים",
    "מקרר – בפנים ובחוץ",
    "תנור – בפנים ובחוץ",
    "כיריים וגריל",
    "מיקרו",
    "כיור",
    "כלים – לשטוף ליבש ולהחזיר לארון",
    "לבדוק שכל הכלים נקיים",
    "לבדוק שיש לפחות 20 כוסות אוכל מכל דבר",
    "ארונות מטבח – לפתוח ולראות שאין דברים להוציא דברים לא קשורים",
    "להעביר סמרטוט על הדלתות מטבח בחוץ",
    "להעביר סמרטוט על הפח ולראות שנקי",
    "פלטת שבת ומיחם מים חמים – לראות שאין אבן",
    "סכו״ם, כלים, סמרטוט, סקוֹץ׳ חדשים לאורחים",
    "סבון",
    // living room
    "סלון שטיפה יסודית גם מתחת לספות ולשולחן, להזיז כורסאות ולבדוק שאין פירורים של אוכל",
    "שולחן אוכל וספסלים (לנקות בשפריצר ולהעביר סמרטוט)",
    "סלון – לנגב אבק ולהעביר סמרטוט גם על הספה. כיריות לנקות לסדר יפה",
    "שולחן אוכל וספסלים – להעביר סמרטוט נקי עם תריס",
    "חלונות ותריסים – עם ספריי חלונות וסמרטוט נקי. שלא יהיו סימנים. מסילות לנקות",
    // hallway
    "מסדרון – לנגב בחוץ שטיחים. לנקות מסילות בחלונות. לנקות חלונות",
    // yard
    "טיפול ברזים וניקוי",
    "להשקות עציצים בכל המתחם",
    "פינת מנגל – לרוקן פחים ולנקות רשת, וכל אזור המנגל",
    "לנקות דשא ולסדר פינות ישיבה",
    "שולחן חוץ – להעביר סמרטוט עם חומר. כיסאות נקיים",
    "שטיפה לרצפה בחוץ",
    "לרוקן את הפחים, לשים שקית חדשה",
    "להעביר סמרטוט על הפחים ולשים שקיות",
];
