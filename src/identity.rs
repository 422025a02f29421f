use std::env;

pub const HOSTNAME_VAR: &str = "HOSTNAME";
pub const UNKNOWN_HOST: &str = "unknown";

/// In a pod the `HOSTNAME` variable is the pod name, so it wins over the OS lookup.
pub fn resolve_hostname() -> String {
    hostname_from(env::var(HOSTNAME_VAR).ok(), os_hostname)
}

pub fn hostname_from<F>(from_env: Option<String>, os: F) -> String
where
    F: FnOnce() -> Option<String>,
{
    if let Some(name) = from_env.filter(|h| !h.trim().is_empty()) {
        return name;
    }
    os()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

fn os_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}
