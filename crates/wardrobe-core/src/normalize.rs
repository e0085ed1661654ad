//! Coercion of an extracted JSON object into a [`GarmentSemantics`] record.
//!
//! Model output is inconsistent about shapes: tags arrive as lists or as
//! comma-joined strings, colors as a string or a list, categories in free
//! form or missing. Every field is first classified into a [`FieldShape`],
//! then a single rule per field decides the final value.

use crate::error::AnalyzeError;
use crate::types::{Category, ExtractedObject, GarmentSemantics};
use chrono::Utc;
use serde_json::Value;

/// Sentinel used when the model could not determine a value.
pub const UNKNOWN: &str = "unknown";

const TOP_KEYWORDS: &[&str] = &[
    "上衣", "衬衫", "夹克", "外套", "t恤", "毛衣", "卫衣", "shirt", "jacket", "coat", "sweater",
    "hoodie",
];
const BOTTOM_KEYWORDS: &[&str] = &[
    "裤", "裙", "短裤", "长裤", "pants", "trousers", "jeans", "skirt", "shorts",
];
const SHOES_KEYWORDS: &[&str] = &["鞋", "靴", "运动鞋", "拖鞋", "shoe", "boot", "sneaker", "sandal"];

/// The shape a raw field arrived in.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape<'a> {
    Text(&'a str),
    List(&'a [Value]),
    Absent,
    /// Any other scalar or an object
    Other(&'a Value),
}

impl<'a> FieldShape<'a> {
    pub fn of(obj: &'a ExtractedObject, key: &str) -> Self {
        match obj.get(key) {
            None | Some(Value::Null) => FieldShape::Absent,
            Some(Value::String(s)) => FieldShape::Text(s),
            Some(Value::Array(items)) => FieldShape::List(items),
            Some(other) => FieldShape::Other(other),
        }
    }
}

/// Normalize `obj` into a validated garment record stamped with the current time.
pub fn normalize(obj: &ExtractedObject) -> Result<GarmentSemantics, AnalyzeError> {
    let item = coerce_item(FieldShape::of(obj, "item"))?;
    let description = coerce_description(FieldShape::of(obj, "description"))?;
    let category = coerce_category(FieldShape::of(obj, "category"), &item);

    Ok(GarmentSemantics {
        category,
        style_semantics: coerce_tags(FieldShape::of(obj, "style_semantics")),
        season_semantics: coerce_tags(FieldShape::of(obj, "season_semantics")),
        usage_semantics: coerce_tags(FieldShape::of(obj, "usage_semantics")),
        color_semantics: coerce_color(FieldShape::of(obj, "color_semantics")),
        item,
        description,
        created_at: Utc::now(),
    })
}

fn coerce_item(shape: FieldShape<'_>) -> Result<String, AnalyzeError> {
    let violation = |message: &str| AnalyzeError::SchemaViolation {
        field: "item".to_string(),
        message: message.to_string(),
    };
    match shape {
        FieldShape::Text(s) if !s.trim().is_empty() => Ok(s.to_string()),
        FieldShape::Text(_) => Err(violation("must not be empty")),
        FieldShape::Absent => Err(violation("is missing")),
        FieldShape::List(_) => Err(violation("must be a string, got a list")),
        FieldShape::Other(Value::Object(_)) => Err(violation("must be a string, got an object")),
        FieldShape::Other(v) => Ok(scalar_text(v)),
    }
}

fn coerce_description(shape: FieldShape<'_>) -> Result<String, AnalyzeError> {
    let violation = |message: &str| AnalyzeError::SchemaViolation {
        field: "description".to_string(),
        message: message.to_string(),
    };
    match shape {
        FieldShape::Text(s) => Ok(s.to_string()),
        FieldShape::Absent => Ok(UNKNOWN.to_string()),
        FieldShape::List(_) => Err(violation("must be a string, got a list")),
        FieldShape::Other(Value::Object(_)) => Err(violation("must be a string, got an object")),
        FieldShape::Other(v) => Ok(scalar_text(v)),
    }
}

fn coerce_category(shape: FieldShape<'_>, item: &str) -> Category {
    if let FieldShape::Text(s) = shape {
        if let Some(category) = Category::parse(s) {
            return category;
        }
    }
    let inferred = infer_category(item);
    tracing::debug!("Category inferred from item '{item}': {inferred}");
    inferred
}

/// Infer a category from keywords in the item name; `top` when nothing matches.
pub fn infer_category(item: &str) -> Category {
    let item = item.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| item.contains(k));

    if hit(TOP_KEYWORDS) {
        Category::Top
    } else if hit(BOTTOM_KEYWORDS) {
        Category::Bottom
    } else if hit(SHOES_KEYWORDS) {
        Category::Shoes
    } else {
        Category::Top
    }
}

fn coerce_tags(shape: FieldShape<'_>) -> Vec<String> {
    match shape {
        FieldShape::Text(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        FieldShape::List(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| scalar_text(v).trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        FieldShape::Absent => Vec::new(),
        FieldShape::Other(v) => vec![scalar_text(v)],
    }
}

fn coerce_color(shape: FieldShape<'_>) -> String {
    match shape {
        FieldShape::Text(s) => s.to_string(),
        FieldShape::List(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        FieldShape::Absent => UNKNOWN.to_string(),
        FieldShape::Other(v) => scalar_text(v),
    }
}

/// String form of a JSON value: strings unquoted, everything else as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> ExtractedObject {
        match value {
            Value::Object(map) => map,
            other => panic!("test fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn test_field_shape_classification() {
        let o = obj(json!({"a": "x", "b": [1], "c": null, "d": 3, "e": {}}));
        assert_eq!(FieldShape::of(&o, "a"), FieldShape::Text("x"));
        assert!(matches!(FieldShape::of(&o, "b"), FieldShape::List(_)));
        assert_eq!(FieldShape::of(&o, "c"), FieldShape::Absent);
        assert_eq!(FieldShape::of(&o, "missing"), FieldShape::Absent);
        assert!(matches!(FieldShape::of(&o, "d"), FieldShape::Other(_)));
        assert!(matches!(FieldShape::of(&o, "e"), FieldShape::Other(_)));
    }

    #[test]
    fn test_full_record() {
        let record = normalize(&obj(json!({
            "category": "bottom",
            "item": "牛仔裤",
            "style_semantics": ["休闲", "街头"],
            "season_semantics": "春, 秋",
            "usage_semantics": ["日常"],
            "color_semantics": "深色系",
            "description": "一条深蓝色直筒牛仔裤"
        })))
        .unwrap();

        assert_eq!(record.category, Category::Bottom);
        assert_eq!(record.item, "牛仔裤");
        assert_eq!(record.style_semantics, ["休闲", "街头"]);
        assert_eq!(record.season_semantics, ["春", "秋"]);
        assert_eq!(record.usage_semantics, ["日常"]);
        assert_eq!(record.color_semantics, "深色系");
        assert_eq!(record.description, "一条深蓝色直筒牛仔裤");
    }

    #[test]
    fn test_color_list_is_joined() {
        let record = normalize(&obj(json!({
            "item": "衬衫",
            "color_semantics": ["白色", "浅蓝"]
        })))
        .unwrap();
        assert_eq!(record.color_semantics, "白色, 浅蓝");
    }

    #[test]
    fn test_color_list_skips_nulls() {
        let record = normalize(&obj(json!({
            "item": "外套",
            "color_semantics": ["黑", null, "灰"]
        })))
        .unwrap();
        assert_eq!(record.color_semantics, "黑, 灰");
    }

    #[test]
    fn test_item_and_description_pass_through_untrimmed() {
        let record = normalize(&obj(json!({
            "item": " 牛仔裤 ",
            "description": "一条牛仔裤。 "
        })))
        .unwrap();
        assert_eq!(record.item, " 牛仔裤 ");
        assert_eq!(record.description, "一条牛仔裤。 ");
        assert_eq!(record.category, Category::Bottom);
    }

    #[test]
    fn test_tag_string_is_split() {
        let record = normalize(&obj(json!({"item": "衬衫", "style_semantics": "a, b,c"}))).unwrap();
        assert_eq!(record.style_semantics, ["a", "b", "c"]);
    }

    #[test]
    fn test_tag_edge_shapes() {
        let record = normalize(&obj(json!({
            "item": "衬衫",
            "style_semantics": " , ,",
            "season_semantics": [" 夏 ", "", null, 4],
            "usage_semantics": true
        })))
        .unwrap();
        assert!(record.style_semantics.is_empty());
        assert_eq!(record.season_semantics, ["夏", "4"]);
        assert_eq!(record.usage_semantics, ["true"]);
    }

    #[test]
    fn test_absent_fields_defaults() {
        let record = normalize(&obj(json!({"item": "拖鞋"}))).unwrap();
        assert!(record.style_semantics.is_empty());
        assert!(record.season_semantics.is_empty());
        assert!(record.usage_semantics.is_empty());
        assert_eq!(record.color_semantics, UNKNOWN);
        assert_eq!(record.description, UNKNOWN);
    }

    #[test]
    fn test_missing_category_inferred_from_item() {
        let record = normalize(&obj(json!({"item": "牛仔裤"}))).unwrap();
        assert_eq!(record.category, Category::Bottom);
    }

    #[test]
    fn test_invalid_category_is_inferred() {
        let record = normalize(&obj(json!({"item": "高帮运动鞋", "category": "footwear"}))).unwrap();
        assert_eq!(record.category, Category::Shoes);

        let record = normalize(&obj(json!({"item": "短裤", "category": ["bottom"]}))).unwrap();
        assert_eq!(record.category, Category::Bottom);
    }

    #[test]
    fn test_valid_category_is_not_overridden() {
        let record = normalize(&obj(json!({"item": "牛仔裤", "category": " TOP "}))).unwrap();
        assert_eq!(record.category, Category::Top);
    }

    #[test]
    fn test_infer_category_keywords() {
        assert_eq!(infer_category("白色T恤"), Category::Top);
        assert_eq!(infer_category("Denim Jacket"), Category::Top);
        assert_eq!(infer_category("百褶裙"), Category::Bottom);
        assert_eq!(infer_category("slim jeans"), Category::Bottom);
        assert_eq!(infer_category("马丁靴"), Category::Shoes);
        assert_eq!(infer_category("Running Sneakers"), Category::Shoes);
    }

    #[test]
    fn test_infer_category_defaults_to_top() {
        assert_eq!(infer_category("围巾"), Category::Top);
        assert_eq!(infer_category(UNKNOWN), Category::Top);
    }

    #[test]
    fn test_unknown_sentinels_preserved() {
        let record = normalize(&obj(json!({
            "item": "unknown",
            "style_semantics": ["unknown"],
            "color_semantics": "unknown",
            "description": "unknown"
        })))
        .unwrap();
        assert_eq!(record.item, UNKNOWN);
        assert_eq!(record.style_semantics, [UNKNOWN]);
        assert_eq!(record.color_semantics, UNKNOWN);
        assert_eq!(record.category, Category::Top);
    }

    #[test]
    fn test_item_violations() {
        for value in [
            json!({}),
            json!({"item": null}),
            json!({"item": "  "}),
            json!({"item": ["a"]}),
            json!({"item": {"name": "a"}}),
        ] {
            let err = normalize(&obj(value.clone())).unwrap_err();
            assert!(
                matches!(err, AnalyzeError::SchemaViolation { ref field, .. } if field == "item"),
                "expected item violation for {value}"
            );
        }
    }

    #[test]
    fn test_description_violations() {
        for description in [json!(["a", "b"]), json!({"text": "a"})] {
            let err = normalize(&obj(json!({"item": "衬衫", "description": description}))).unwrap_err();
            assert!(matches!(
                err,
                AnalyzeError::SchemaViolation { ref field, .. } if field == "description"
            ));
        }
    }

    #[test]
    fn test_record_serializes_to_persisted_shape() {
        let record = normalize(&obj(json!({"item": "外套", "color_semantics": ["黑"]}))).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["category"], "top");
        assert_eq!(value["color_semantics"], "黑");
        assert!(value["style_semantics"].as_array().unwrap().is_empty());
        assert!(value["created_at"].as_str().unwrap().contains('T'));
    }
}
