use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    digest::{sha1_files_from, ContentSource, FsSource},
    error::CheckError,
    fileset::FileSet,
    observer::CheckObserver,
    report::CheckResponse,
    types::Severity,
};

static RE_SHA1_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"));

#[derive(Debug, Clone, Default)]
pub struct IntegrityOptions {
    pub expected_digest: Option<String>,
    pub recursive: bool,
    pub generate_only: bool,
}

impl IntegrityOptions {
    pub fn verify(expected: impl Into<String>) -> Self {
        Self {
            expected_digest: Some(expected.into()),
            ..Self::default()
        }
    }

    pub fn generate() -> Self {
        Self {
            generate_only: true,
            ..Self::default()
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Hash a file or directory and compare it to an expected SHA-1, or just report it.
///
/// Large recursive targets have no time bound; the poller's own timeout is the limit.
pub fn check_integrity(
    target: &Path,
    opts: &IntegrityOptions,
    observer: &dyn CheckObserver,
) -> CheckResponse {
    check_integrity_with(target, opts, &FsSource, observer)
}

/// As [`check_integrity`], reading file contents through `source`.
pub fn check_integrity_with(
    target: &Path,
    opts: &IntegrityOptions,
    source: &dyn ContentSource,
    observer: &dyn CheckObserver,
) -> CheckResponse {
    let mut response = CheckResponse::new("Integrity Test");

    let files = match FileSet::resolve(target, opts.recursive) {
        Ok(files) => files,
        Err(e @ CheckError::NotFound { .. }) => {
            response.resolve(Severity::Unknown, e.to_string());
            return response;
        }
        Err(e) => {
            observer.error(format_args!("file list for {} failed: {}", target.display(), e));
            response.resolve(
                Severity::Unknown,
                format!("Unable to make file list because {e}"),
            );
            return response;
        }
    };
    observer.debug(format_args!(
        "{} files under {} (recursive={})",
        files.len(),
        target.display(),
        opts.recursive
    ));

    let actual = match sha1_files_from(source, files.iter()) {
        Ok(hex) => hex,
        Err(e) => {
            observer.error(format_args!("hashing {} failed: {}", target.display(), e));
            response.resolve(
                Severity::Unknown,
                format!("Unable to check integrity of {} because {e}", target.display()),
            );
            return response;
        }
    };

    if opts.generate_only {
        response.resolve(
            Severity::Ok,
            format!("SHA1 hash of {} is {actual}", target.display()),
        );
        return response;
    }

    match opts.expected_digest.as_deref() {
        Some(expected) if expected == actual => {
            response.resolve(
                Severity::Ok,
                format!("SHA1 hash of {} matches", target.display()),
            );
        }
        expected => {
            response.resolve(
                Severity::Critical,
                format!("SHA1 hash mismatch. {} has changed", target.display()),
            );
            if !expected.is_some_and(|e| RE_SHA1_HEX.is_match(e)) {
                response.verbose = Some(
                    "expected value is not a 40 character lowercase hex SHA1 digest".to_string(),
                );
            }
        }
    }

    response
}
