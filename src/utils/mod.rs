pub mod environment;
pub mod logging;
pub mod paths;
pub mod terminal;

pub use environment::{get_config_dir, get_log_dir};
pub use logging::{init_file_logging, init_stderr_logging};
pub use paths::{encode_path_segment, endpoint_url};
pub use terminal::strip_ansi_codes;
