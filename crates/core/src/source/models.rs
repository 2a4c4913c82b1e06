//! Record schemas for the two mirrored collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A game brand (provider/vendor) document.
///
/// Only the image fields are mirrored; the rest is decoded so malformed
/// documents are caught, but otherwise unused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameBrand {
    #[serde(rename = "_id")]
    pub id: Option<serde_json::Value>,
    pub code: Option<String>,
    pub wallet_code: Option<String>,
    pub game_type: Option<String>,
    pub brief: Option<serde_json::Value>,
    pub status: Option<String>,
    pub logo: Option<String>,
    pub vendor_image: Option<String>,
    pub brand_image: Option<String>,
    pub product_img_1: Option<String>,
    pub product_img_2: Option<String>,
    pub game_provider_code: Option<String>,
    pub name_ph: Option<String>,
}

impl GameBrand {
    /// Non-empty image references, in field order.
    pub fn image_refs(&self) -> Vec<&str> {
        non_empty([
            &self.logo,
            &self.vendor_image,
            &self.brand_image,
            &self.product_img_1,
            &self.product_img_2,
        ])
    }
}

/// A single game document.
///
/// The localized `image_*` fields are carried but not mirrored; only
/// `image` is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub game_provider_code: Option<String>,
    pub game_brand_code: Option<String>,
    pub game_code: Option<String>,
    pub game_type: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "name_zh-CN")]
    pub name_zh_cn: Option<String>,
    pub name_en: Option<String>,
    #[serde(rename = "name_vi-VN")]
    pub name_vi_vn: Option<String>,
    #[serde(rename = "name_zh-HK")]
    pub name_zh_hk: Option<String>,
    pub name_th: Option<String>,
    pub name_ph: Option<String>,
    pub image_en: Option<String>,
    pub image_th: Option<String>,
    #[serde(rename = "image_vi-VN")]
    pub image_vi_vn: Option<String>,
    #[serde(rename = "image_zh-CN")]
    pub image_zh_cn: Option<String>,
    #[serde(rename = "image_zh-HK")]
    pub image_zh_hk: Option<String>,
    pub image: Option<String>,
}

impl Game {
    pub fn image_refs(&self) -> Vec<&str> {
        non_empty([&self.image])
    }
}

fn non_empty<const N: usize>(fields: [&Option<String>; N]) -> Vec<&str> {
    fields
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|value| !value.is_empty())
        .collect()
}

/// A decoded document from either collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRecord {
    Brand(GameBrand),
    Game(Game),
}

impl ImageRecord {
    pub fn image_refs(&self) -> Vec<&str> {
        match self {
            ImageRecord::Brand(brand) => brand.image_refs(),
            ImageRecord::Game(game) => game.image_refs(),
        }
    }
}

/// The collections scanned for image references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    GameBrand,
    Game,
}

impl Collection {
    /// Scan order: brands first, then games.
    pub const ALL: [Collection; 2] = [Collection::GameBrand, Collection::Game];

    /// Table holding this collection's documents.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::GameBrand => "game_brand",
            Collection::Game => "game",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.table()
    }

    /// Decodes one JSON document of this collection.
    pub fn decode(&self, document: &str) -> Result<ImageRecord, serde_json::Error> {
        match self {
            Collection::GameBrand => serde_json::from_str(document).map(ImageRecord::Brand),
            Collection::Game => serde_json::from_str(document).map(ImageRecord::Game),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_refs_in_field_order() {
        let record = Collection::GameBrand
            .decode(
                r#"{
                    "_id": {"$oid": "64b7f0c2a1"},
                    "code": "PG",
                    "brief": {"en": "Slots"},
                    "product_img_2": "brand/p2.png",
                    "logo": "brand/logo.png",
                    "vendor_image": "",
                    "brand_image": "brand/brand.png"
                }"#,
            )
            .unwrap();

        assert_eq!(
            record.image_refs(),
            vec!["brand/logo.png", "brand/brand.png", "brand/p2.png"]
        );
    }

    #[test]
    fn test_game_mirrors_only_image() {
        let record = Collection::Game
            .decode(
                r#"{
                    "game_code": "g-1",
                    "name_zh-CN": "游戏",
                    "image_vi-VN": "game/vi.png",
                    "image_en": "game/en.png",
                    "image": "game/main.png"
                }"#,
            )
            .unwrap();

        let ImageRecord::Game(game) = &record else {
            panic!("expected a game record");
        };
        assert_eq!(game.name_zh_cn.as_deref(), Some("游戏"));
        assert_eq!(game.image_vi_vn.as_deref(), Some("game/vi.png"));
        assert_eq!(record.image_refs(), vec!["game/main.png"]);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let record = Collection::Game.decode(r#"{"image": null}"#).unwrap();
        assert!(record.image_refs().is_empty());

        let record = Collection::GameBrand.decode("{}").unwrap();
        assert!(record.image_refs().is_empty());
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(Collection::Game.decode("not json").is_err());
        assert!(Collection::GameBrand.decode(r#"{"logo": 42}"#).is_err());
        assert!(Collection::Game.decode(r#"{"image": ["a.png"]}"#).is_err());
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::GameBrand.table(), "game_brand");
        assert_eq!(Collection::Game.to_string(), "game");
        assert_eq!(Collection::ALL, [Collection::GameBrand, Collection::Game]);
    }
}
