//! Logger setup built on `tracing-subscriber`.

use tracing_subscriber::{EnvFilter, fmt};

/// Build the filter directive used when `RUST_LOG` is not set.
///
/// The binary's own crate and the client library both log at `default_level`.
pub fn default_directive(bin_name: &str, default_level: &str) -> String {
    let crate_name = bin_name.replace('-', "_");
    if crate_name == "chatlink_client" {
        return format!("{crate_name}={default_level}");
    }
    format!("{crate_name}={default_level},chatlink_client={default_level}")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once is harmless: later calls leave the first subscriber in place.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, default_level)));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(bin_name, "logger initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_replaces_hyphens() {
        // テスト項目: バイナリ名のハイフンがクレート名のアンダースコアに変換される
        // when (操作):
        let directive = default_directive("chatlink-demo", "debug");

        // then (期待する結果):
        assert_eq!(directive, "chatlink_demo=debug,chatlink_client=debug");
    }

    #[test]
    fn test_default_directive_for_library_binary() {
        // テスト項目: ライブラリと同名のバイナリではディレクティブが重複しない
        let directive = default_directive("chatlink-client", "info");
        assert_eq!(directive, "chatlink_client=info");
    }

    #[test]
    fn test_setup_logger_twice_does_not_panic() {
        // テスト項目: setup_logger を複数回呼び出しても panic しない
        setup_logger("chatlink-test", "info");
        setup_logger("chatlink-test", "debug");
    }
}
