use chrono::Local;

/// Clock time shown next to the ticker line.
pub fn status_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

pub fn current_human_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}
