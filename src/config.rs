use clap::Parser;

/// The default upload path for the filesystem storage hierarchy.
const DEFAULT_UPLOAD_PATH: &str = "upload";
/// The default policy for physical deletions during recursive folder removal.
const DEFAULT_DELETE_POLICY: &str = "best-effort";

#[derive(Debug, Parser)]
#[command(name = "cumulus", version = "0.1", about = "Personal cloud storage engine", long_about = None)]
pub struct StartArgs {
    /// Database URL.
    #[arg(short, long)]
    db_url: Option<String>,

    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Base directory of the physical storage hierarchy.
    #[arg(short, long)]
    upload_path: Option<String>,

    /// Physical deletion policy for recursive folder removal
    /// (`strict` or `best-effort`).
    #[arg(long)]
    delete_policy: Option<String>,
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and either panic or default if neither the argument nor the environment variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, panic $msg:literal) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => panic!($msg),
                    },
                }
            }
        }
    };
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
}

arg!(db_url,        "DATABASE_URL",  panic   "Database url not found; Pass --db-url or set DATABASE_URL");
arg!(log,           "RUST_LOG",      default "info".to_string());
arg!(upload_path,   "UPLOAD_PATH",   default DEFAULT_UPLOAD_PATH.to_string());
arg!(delete_policy, "DELETE_POLICY", default DEFAULT_DELETE_POLICY.to_string());
