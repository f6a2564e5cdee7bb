use nomi_domain::config::{Config, ConfigSeverity};

/// Validate the config and print a report.  Returns `true` when no errors
/// were found (warnings alone still pass).
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let (errors, warnings): (Vec<_>, Vec<_>) = issues
        .iter()
        .partition(|i| i.severity == ConfigSeverity::Error);

    for issue in errors.iter().chain(warnings.iter()) {
        println!("{issue}");
    }
    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        errors.len(),
        warnings.len()
    );

    errors.is_empty()
}

/// Render the resolved config (defaults filled in) as TOML, with any
/// plaintext credential masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut redacted = config.clone();
    if let Some(key) = redacted.llm.auth.key.as_mut() {
        *key = mask(key);
    }
    Ok(toml::to_string_pretty(&redacted)?)
}

pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".into()
    } else {
        format!("{visible}********")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_plaintext_key() {
        let mut cfg = Config::default();
        cfg.llm.auth.key = Some("sk-very-secret-value".into());
        let out = render(&cfg).unwrap();
        assert!(out.contains("sk-v********"));
        assert!(!out.contains("very-secret"));
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask("abc"), "********");
    }

    #[test]
    fn defaults_validate() {
        assert!(validate(&Config::default(), "config.toml"));
    }
}
