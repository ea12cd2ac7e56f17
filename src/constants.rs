// Environment variables
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_AUTH_TOKEN: &str = "DATABASE_AUTH_TOKEN";
pub const ENV_ALLOWED_USER_IDS: &str = "ALLOWED_USER_IDS";
pub const ENV_SYNC_ALLOW_LIST: &str = "SYNC_ALLOW_LIST";
pub const DEFAULT_LOG_FILTER: &str = "expense_bot=info,warn";

// Keyboard buttons, matched verbatim against incoming text
pub const BUTTON_ADD_EXPENSE: &str = "Add expense";
pub const BUTTON_SEE_EXPENSES: &str = "See expenses";
pub const BUTTON_SEE_LAST_MONTH: &str = "See last month";
pub const KEYBOARD_LAYOUT: [&str; 3] = [BUTTON_ADD_EXPENSE, BUTTON_SEE_EXPENSES, BUTTON_SEE_LAST_MONTH];

// Welcome commands
pub const COMMAND_START: &str = "/start";
pub const COMMAND_HELP: &str = "/help";

// Limits
pub const RECENT_EXPENSES_LIMIT: u32 = 10;
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999_999;

// Stored pending action kinds
pub const ACTION_NONE: &str = "none";
pub const ACTION_AWAIT_AMOUNT: &str = "await_amount";
pub const ACTION_AWAIT_TITLE: &str = "await_title";

// User-visible messages
pub const MSG_DENIED: &str = "This bot is private. Access denied.";
pub const MSG_NOT_PROVISIONED: &str = "Access error (not whitelisted in DB).";
pub const MSG_WELCOME: &str = "Welcome! Use the buttons below 👇";
pub const MSG_ASK_AMOUNT: &str = "Send the amount (e.g., 23.50)";
pub const MSG_INVALID_AMOUNT: &str = "Invalid amount. Try again, e.g. 12.30";
pub const MSG_ASK_TITLE: &str = "Now send the title (e.g., Groceries)";
pub const MSG_EMPTY_TITLE: &str = "Title can't be empty. Send a short title.";
pub const MSG_SAVE_FAILED: &str = "Save failed. Please try again.";
pub const MSG_STORE_FAILURE: &str = "Something went wrong on our side. Please try again.";
pub const MSG_HELP: &str = "Use the buttons below to add or view expenses.";
pub const MSG_NO_ITEMS: &str = "(no items yet)";
