use crate::core::prompt::{Validate, validator};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Synchronous rule over the current text of an input box.
pub type Check = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

pub const RESERVED_APPLICATION_NAME: &str = "vscode";

pub fn required() -> Check {
    Arc::new(|value: &str| {
        if value.trim().is_empty() {
            Err("This field is required".to_string())
        } else {
            Ok(())
        }
    })
}

pub fn port() -> Check {
    Arc::new(|value: &str| match value.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(()),
        _ => Err("Port must be a number between 1 and 65535".to_string()),
    })
}

pub fn application_name() -> Check {
    Arc::new(|value: &str| {
        if value == RESERVED_APPLICATION_NAME {
            return Err("Name not unique".to_string());
        }
        if !is_lowercase_alphanumeric(value) {
            return Err("Application name must be lowercase alphanumeric".to_string());
        }
        Ok(())
    })
}

pub fn image_name() -> Check {
    Arc::new(|value: &str| {
        let invalid = "Invalid container image name. Must be lowercase alphanumeric";
        if value.is_empty() {
            return Err(invalid.to_string());
        }
        if value.to_lowercase() != value {
            return Err("Invalid container image name. Must be lowercase".to_string());
        }
        if !is_lowercase_alphanumeric(value) {
            return Err(invalid.to_string());
        }
        Ok(())
    })
}

pub fn branch() -> Check {
    Arc::new(|value: &str| {
        if value.is_empty() {
            Err("GitHub branch name must not be blank".to_string())
        } else {
            Ok(())
        }
    })
}

pub fn regex(pattern: &str) -> Result<Check, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(Arc::new(move |value: &str| {
        if re.is_match(value) {
            Ok(())
        } else {
            Err(format!("Value must match pattern: {}", re.as_str()))
        }
    }))
}

/// First failing check wins.
pub fn all(checks: Vec<Check>) -> Check {
    Arc::new(move |value: &str| {
        for check in &checks {
            check(value)?;
        }
        Ok(())
    })
}

pub fn immediate(check: Check) -> Validate {
    validator(move |value: String| {
        let check = check.clone();
        async move { check(&value).err() }
    })
}

/// Runs `check` after `delay` so errors do not flash while the user types.
pub fn delayed(delay: Duration, check: Check) -> Validate {
    validator(move |value: String| {
        let check = check.clone();
        async move {
            tokio::time::sleep(delay).await;
            check(&value).err()
        }
    })
}

/// Accepts a path, relative to `root` and not leaving it, that names an
/// existing directory.
pub fn existing_dir(root: impl Into<PathBuf>, delay: Duration) -> Validate {
    let root = root.into();
    validator(move |value: String| {
        let path = stays_inside(Path::new(&value)).then(|| root.join(&value));
        async move {
            tokio::time::sleep(delay).await;
            let Some(path) = path else {
                return Some("Input must be a directory inside the workspace".to_string());
            };
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => None,
                _ => Some("Input must be an existing directory".to_string()),
            }
        }
    })
}

fn stays_inside(relative: &Path) -> bool {
    relative
        .components()
        .all(|part| matches!(part, Component::Normal(_) | Component::CurDir))
}

fn is_lowercase_alphanumeric(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_bounds() {
        let check = port();
        assert!(check("8080").is_ok());
        assert!(check("1").is_ok());
        assert!(check("65535").is_ok());
        assert!(check("0").is_err());
        assert!(check("70000").is_err());
        assert!(check("http").is_err());
        assert!(check("").is_err());
    }

    #[test]
    fn application_name_rejects_reserved_name() {
        let check = application_name();
        assert_eq!(check("vscode"), Err("Name not unique".to_string()));
        assert!(check("myapp").is_ok());
        assert!(check("app2").is_ok());
        assert!(check("").is_err());
        assert!(check("My-App").is_err());
    }

    #[test]
    fn image_name_messages() {
        let check = image_name();
        assert!(check("web01").is_ok());
        assert_eq!(
            check("Web"),
            Err("Invalid container image name. Must be lowercase".to_string())
        );
        assert_eq!(
            check("web-app"),
            Err("Invalid container image name. Must be lowercase alphanumeric".to_string())
        );
        assert!(check("").is_err());
    }

    #[test]
    fn all_reports_first_failure() {
        let check = all(vec![required(), port()]);
        assert_eq!(check(" "), Err("This field is required".to_string()));
        assert!(check("443").is_ok());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(regex("(").is_err());
        let check = regex("^v[0-9]+$").expect("valid pattern");
        assert!(check("v12").is_ok());
        assert!(check("12").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_waits_before_answering() {
        let validate = delayed(Duration::from_millis(250), branch());
        let started = tokio::time::Instant::now();
        assert_eq!(
            validate(String::new()).await,
            Some("GitHub branch name must not be blank".to_string())
        );
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert_eq!(validate("main".to_string()).await, None);
    }

    #[tokio::test]
    async fn existing_dir_checks_the_workspace() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(root.path().join("manifests")).expect("mkdir");
        std::fs::write(root.path().join("file.yaml"), "kind: Pod").expect("write");

        let validate = existing_dir(root.path(), Duration::ZERO);
        assert_eq!(validate("manifests".to_string()).await, None);
        assert!(validate("file.yaml".to_string()).await.is_some());
        assert!(validate("missing".to_string()).await.is_some());
    }

    #[tokio::test]
    async fn existing_dir_stays_inside_the_workspace() {
        let outside = tempfile::tempdir().expect("tempdir");
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(root.path().join("manifests")).expect("mkdir");

        let validate = existing_dir(root.path(), Duration::ZERO);
        let absolute = outside.path().to_string_lossy().into_owned();
        let outside_message = Some("Input must be a directory inside the workspace".to_string());
        assert_eq!(validate(absolute).await, outside_message);
        assert_eq!(validate("../".to_string()).await, outside_message);
        assert_eq!(validate("a/../..".to_string()).await, outside_message);
        assert_eq!(validate("./manifests".to_string()).await, None);
    }
}
