//! Mini app manifest served at `/.well-known/farcaster.json`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::app::{AppConfig, AppState, chain_name};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseBuilder {
    pub owner_address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniApp {
    pub version: &'static str,
    pub name: &'static str,
    pub subtitle: String,
    pub description: String,
    pub screenshot_urls: Vec<String>,
    pub icon_url: String,
    pub splash_image_url: String,
    pub splash_background_color: &'static str,
    pub home_url: String,
    pub webhook_url: String,
    pub primary_category: &'static str,
    pub tags: Vec<&'static str>,
    pub hero_image_url: String,
    pub tagline: &'static str,
    pub og_title: &'static str,
    pub og_description: String,
    pub og_image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub account_association: AccountAssociation,
    pub base_builder: BaseBuilder,
    pub miniapp: MiniApp,
}

impl Manifest {
    pub fn for_config(config: &AppConfig) -> Self {
        let root = config.root_url.trim_end_matches('/');
        let asset = |path: &str| format!("{root}/{path}");

        Self {
            account_association: AccountAssociation::default(),
            base_builder: BaseBuilder::default(),
            miniapp: MiniApp {
                version: "1",
                name: "gasless-basename-app",
                subtitle: String::new(),
                description: String::new(),
                screenshot_urls: vec![asset("screenshot.png")],
                icon_url: asset("icon.png"),
                splash_image_url: asset("splash.png"),
                splash_background_color: "#f8fafc",
                home_url: root.to_string(),
                webhook_url: asset("api/webhook"),
                primary_category: "utility",
                tags: vec!["utility", "identity", "basename", "gasless"],
                hero_image_url: asset("hero.png"),
                tagline: "Mint your .base name gasless & instantly.",
                og_title: "Basename Gasless App - Claim your identity",
                og_description: format!(
                    "The easiest way to mint your .base name on {}. Gasless transactions & USDC supported.",
                    chain_name(config.expected_chain_id)
                ),
                og_image_url: asset("hero.png"),
            },
        }
    }
}

pub async fn manifest_handler(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(Manifest::for_config(state.service.config()))
}
