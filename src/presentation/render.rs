//! Interchangeable rendering adapters over [`ViewModel`].

use std::fmt::Write;

use crate::domain::{PaymentRail, ViewFormat};

use super::view::ViewModel;

pub trait Renderer: Send + Sync {
    /// `Content-Type` of the rendered output.
    fn content_type(&self) -> &'static str;

    fn render(&self, view: &ViewModel) -> String;
}

/// Pick the adapter for a requested format.
pub fn renderer_for(format: ViewFormat) -> Box<dyn Renderer> {
    match format {
        ViewFormat::Text => Box::new(PlainTextRenderer),
        ViewFormat::Markdown => Box::new(MarkdownRenderer),
    }
}

fn rail_marks(rail: PaymentRail) -> (&'static str, &'static str) {
    match rail {
        PaymentRail::Native => ("x", " "),
        PaymentRail::Stable => (" ", "x"),
    }
}

/// Terminal-friendly layout.
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, view: &ViewModel) -> String {
        let mut out = String::new();
        if let Some(banner) = &view.network_banner {
            let _ = writeln!(out, "!! {} [{}]", banner.message, banner.action_label);
        }
        let shown = if view.name.is_empty() { "-" } else { view.name.as_str() };
        let _ = writeln!(out, "Name: {shown}.base  ({})", view.badge.text);
        let (native, stable) = rail_marks(view.rail);
        let _ = writeln!(out, "[{native}] Pay with ETH   {}", view.native_price);
        let _ = writeln!(out, "[{stable}] Pay with USDC  {}", view.stable_price);
        let state = if view.primary.enabled { "" } else { " (disabled)" };
        let _ = writeln!(out, "> {}{state}", view.primary.label);
        for line in [&view.notice, &view.error_line, &view.earlier_attempt]
            .into_iter()
            .flatten()
        {
            let _ = writeln!(out, "{line}");
        }
        if let Some(hash) = &view.transaction_hash {
            let _ = writeln!(out, "Tx: {hash}");
        }
        out
    }
}

/// Markdown for chat surfaces and bots.
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn content_type(&self) -> &'static str {
        "text/markdown; charset=utf-8"
    }

    fn render(&self, view: &ViewModel) -> String {
        let mut out = String::new();
        if let Some(banner) = &view.network_banner {
            let _ = writeln!(out, "> **{}** _{}_\n", banner.message, banner.action_label);
        }
        if view.name.is_empty() {
            let _ = writeln!(out, "### _{}_\n", view.badge.text);
        } else {
            let _ = writeln!(out, "### `{}.base` · {}\n", view.name, view.badge.text);
        }
        let (native, stable) = rail_marks(view.rail);
        let _ = writeln!(out, "- [{native}] ETH: {}", view.native_price);
        let _ = writeln!(out, "- [{stable}] USDC: {}\n", view.stable_price);
        if view.primary.enabled {
            let _ = writeln!(out, "**{}**", view.primary.label);
        } else {
            let _ = writeln!(out, "~~{}~~", view.primary.label);
        }
        if let Some(notice) = &view.notice {
            let _ = writeln!(out, "\n_{notice}_");
        }
        if let Some(error) = &view.error_line {
            let _ = writeln!(out, "\n**{error}**");
            if let Some(details) = &view.error_details {
                let _ = writeln!(out, "\n```\n{details}\n```");
            }
        }
        if let Some(earlier) = &view.earlier_attempt {
            let _ = writeln!(out, "\n_{earlier}_");
        }
        if let Some(hash) = &view.transaction_hash {
            let _ = writeln!(out, "\nTransaction: `{hash}`");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{BASE_SEPOLIA_CHAIN_ID, MintSession};
    use crate::domain::WalletStatus;

    fn ready_view() -> ViewModel {
        let mut session = MintSession::new(BASE_SEPOLIA_CHAIN_ID);
        session.set_name("Alice");
        let ticket = session.availability.begin_check().unwrap();
        session.availability.resolve(&ticket, Ok(true));
        let wallet = WalletStatus {
            connected: true,
            address: Some("0xabc".to_string()),
            chain_id: Some(BASE_SEPOLIA_CHAIN_ID),
        };
        ViewModel::from_snapshot(&session.snapshot(wallet, None))
    }

    #[test]
    fn test_plain_text() {
        let out = PlainTextRenderer.render(&ready_view());
        assert!(out.contains("Name: alice.base  (Available)"));
        assert!(out.contains("[x] Pay with ETH   0.0005 ETH"));
        assert!(out.contains("> Mint now (0.0005 ETH, gasless)\n"));
        assert!(!out.contains("(disabled)"));
    }

    #[test]
    fn test_markdown() {
        let out = MarkdownRenderer.render(&ready_view());
        assert!(out.contains("### `alice.base` · Available"));
        assert!(out.contains("- [ ] USDC: 10.00 USDC"));
        assert!(out.contains("**Mint now (0.0005 ETH, gasless)**"));
    }

    #[test]
    fn test_renderer_for_format() {
        assert_eq!(
            renderer_for(ViewFormat::Markdown).content_type(),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(
            renderer_for(ViewFormat::Text).content_type(),
            "text/plain; charset=utf-8"
        );
    }
}
