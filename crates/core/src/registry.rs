use std::fmt;
use std::str::FromStr;

use crate::{
    digest::sha1_hex,
    error::CheckError,
    observer::CheckObserver,
    report::CheckResponse,
    types::Severity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
    PerformanceData,
    DynData,
}

impl Hive {
    pub fn name(self) -> &'static str {
        match self {
            Hive::ClassesRoot => "HKEY_CLASSES_ROOT",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::Users => "HKEY_USERS",
            Hive::CurrentConfig => "HKEY_CURRENT_CONFIG",
            Hive::PerformanceData => "HKEY_PERFORMANCE_DATA",
            Hive::DynData => "HKEY_DYN_DATA",
        }
    }
}

impl FromStr for Hive {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "HKEY_CLASSES_ROOT" | "HKCR" => Hive::ClassesRoot,
            "HKEY_CURRENT_USER" | "HKCU" => Hive::CurrentUser,
            "HKEY_LOCAL_MACHINE" | "HKLM" => Hive::LocalMachine,
            "HKEY_USERS" | "HKU" => Hive::Users,
            "HKEY_CURRENT_CONFIG" | "HKCC" => Hive::CurrentConfig,
            "HKEY_PERFORMANCE_DATA" => Hive::PerformanceData,
            "HKEY_DYN_DATA" => Hive::DynData,
            other => return Err(CheckError::UnknownHive(other.to_string())),
        })
    }
}

/// `HIVE\key\path\ValueName`; an empty value name addresses the key's default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPath {
    pub hive: Hive,
    pub key: String,
    pub value_name: String,
}

impl FromStr for RegistryPath {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('\\').collect();
        if parts.len() < 2 {
            return Err(CheckError::InvalidRegistryKey(format!(
                "{s} needs at least a hive and a value name"
            )));
        }
        let hive = parts.remove(0).parse()?;
        let value_name = parts.pop().unwrap_or_default().to_string();

        Ok(Self {
            hive,
            key: parts.join("\\"),
            value_name,
        })
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hive.name())?;
        if !self.key.is_empty() {
            write!(f, "\\{}", self.key)?;
        }
        write!(f, "\\{}", self.value_name)
    }
}

pub trait RegistryReader {
    /// The value stringified the way it should be compared.
    fn read_value(&self, path: &RegistryPath) -> Result<String, CheckError>;
}

/// Reads the live Windows registry; elsewhere every read fails as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRegistry;

#[cfg(windows)]
impl RegistryReader for SystemRegistry {
    fn read_value(&self, path: &RegistryPath) -> Result<String, CheckError> {
        use winreg::enums::*;
        use winreg::RegKey;

        let hkey = match path.hive {
            Hive::ClassesRoot => HKEY_CLASSES_ROOT,
            Hive::CurrentUser => HKEY_CURRENT_USER,
            Hive::LocalMachine => HKEY_LOCAL_MACHINE,
            Hive::Users => HKEY_USERS,
            Hive::CurrentConfig => HKEY_CURRENT_CONFIG,
            Hive::PerformanceData => HKEY_PERFORMANCE_DATA,
            Hive::DynData => HKEY_DYN_DATA,
        };
        let key = RegKey::predef(hkey)
            .open_subkey(&path.key)
            .map_err(|e| CheckError::io(format!("open {}\\{}", path.hive.name(), path.key), e))?;
        let value = key
            .get_raw_value(&path.value_name)
            .map_err(|e| CheckError::io(format!("query {path}"), e))?;
        Ok(value.to_string())
    }
}

#[cfg(not(windows))]
impl RegistryReader for SystemRegistry {
    fn read_value(&self, _path: &RegistryPath) -> Result<String, CheckError> {
        Err(CheckError::Unsupported(
            "registry checks are only available on Windows",
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    pub expected_value: Option<String>,
    pub retrieve_only: bool,
    /// Compare and report the SHA-1 of the value instead of the value itself.
    pub compare_hash: bool,
}

pub fn check_registry_value(
    full_key: &str,
    opts: &RegistryOptions,
    reader: &dyn RegistryReader,
    observer: &dyn CheckObserver,
) -> CheckResponse {
    let mut response = CheckResponse::new("Registry key check");

    let path: RegistryPath = match full_key.parse() {
        Ok(p) => p,
        Err(e @ CheckError::UnknownHive(_)) => {
            response.resolve(Severity::Unknown, e.to_string());
            return response;
        }
        Err(e) => {
            observer.error(format_args!("Unable to parse registry key: {e}"));
            response.resolve(
                Severity::Unknown,
                format!("Unable to parse registry key: {e}"),
            );
            return response;
        }
    };

    let found = match reader.read_value(&path) {
        Ok(v) if opts.compare_hash => sha1_hex(v.as_bytes()),
        Ok(v) => v,
        Err(e) => {
            observer.error(format_args!("reading {path} failed: {e}"));
            response.resolve(
                Severity::Unknown,
                format!("Unable to check registry key because {e}"),
            );
            return response;
        }
    };
    observer.debug(format_args!("{path} = {found}"));

    if opts.retrieve_only {
        let label = if opts.compare_hash {
            "SHA1 hash of this key value is"
        } else {
            "Value of this key is"
        };
        response.resolve(Severity::Ok, format!("{label}: {found}"));
        return response;
    }

    match opts.expected_value.as_deref() {
        Some(expected) if expected == found => {
            response.resolve(Severity::Ok, "The registry key value was correct");
        }
        expected => response.resolve(
            Severity::Critical,
            format!(
                "The returned registry value {found} did not match {}",
                expected.unwrap_or_default()
            ),
        ),
    }

    response
}
