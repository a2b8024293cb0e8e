use std::path::Path;

use crate::{observer::CheckObserver, report::CheckResponse, types::Severity};

/// OK when `path` exists (following symlinks), CRITICAL when it does not.
pub fn check_exists(path: &Path, observer: &dyn CheckObserver) -> CheckResponse {
    let mut response = CheckResponse::new("path exists test");

    match path.try_exists() {
        Ok(true) => response.resolve(Severity::Ok, format!("{} does exist", path.display())),
        Ok(false) => response.resolve(
            Severity::Critical,
            format!("{} does not exist", path.display()),
        ),
        Err(e) => {
            observer.error(format_args!("exists check on {} failed: {}", path.display(), e));
            response.resolve(
                Severity::Unknown,
                format!("Unable to check for file {} because {e}", path.display()),
            );
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    #[test]
    fn existing_directory_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let r = check_exists(dir.path(), &NullObserver);
        assert_eq!(r.severity, Severity::Ok);
        assert_eq!(r.render(), format!("OK: {} does exist", dir.path().display()));
    }

    #[test]
    fn missing_file_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("absent.cfg");
        let r = check_exists(&p, &NullObserver);
        assert_eq!(r.severity, Severity::Critical);
        assert!(r.message.ends_with("does not exist"));
    }
}
