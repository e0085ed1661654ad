//! Prompt texts sent alongside the image.

/// Garment classification into the semantic schema.
///
/// The keys here must match the ones read by [`crate::normalize`].
pub const GARMENT_SEMANTIC_PROMPT: &str = r#"你是一名服装语义分析助手，负责理解衣物的语义，而不是做目标检测。

请只关注衣物本身的语义特征，不要描述像素、位置或背景。
分析结果将用于智能衣橱的搭配推荐与推理。

请严格按照下面的 JSON 结构返回，只输出 JSON，不要附加任何解释：
{
  "category": "top | bottom | shoes 三者之一",
  "item": "具体衣物名称，例如 T恤、牛仔裤、运动鞋",
  "style_semantics": ["风格标签，例如 休闲、正式、运动"],
  "season_semantics": ["适用季节，从 春、夏、秋、冬 中选择"],
  "usage_semantics": ["适用场合，例如 通勤、日常、运动、约会"],
  "color_semantics": "颜色语义，例如 深色系、浅色系、中性色",
  "description": "一句话的语义总结"
}

要求：
- 数组字段即使只有一个元素也必须返回数组。
- color_semantics 必须是字符串，不能是数组。
- 无法判断的字段填写 "unknown"；数组字段无法判断时返回 ["unknown"]。
"#;

/// General item recognition. The reply is returned as extracted JSON without
/// garment normalization.
pub const ITEMS_ANALYZE_PROMPT: &str = r#"你是一名物品识别与信息提取助手。请分析图片中的物品，并给出结构化的识别结果。

识别要求：
1. 识别图片中所有显著的物品，并区分主要物品与背景或附属物品。
2. 依据可见特征推断物品属性。
3. 多个相同物品合并为一项并注明数量。
4. 如有可见损坏、异常或可能的危险物品，请明确说明。
5. 如果图片质量影响识别，请说明限制因素。

请只输出如下结构的 JSON：
{
  "items": {
    "name": "物品名称",
    "category": "物品分类，例如 电子设备、办公用品、工具设备、家具设备、生活用品、文档资料、原材料、其他",
    "confidence": 0.95,
    "attributes": {
      "color": "颜色",
      "size": "尺寸描述",
      "material": "材质",
      "brand": "品牌（如有）",
      "model": "型号（如有）",
      "condition": "新旧程度",
      "quantity": "数量"
    },
    "identification_marks": ["条形码、序列号、标签文字等可见标识"],
    "specifications": {},
    "status_assessment": {
      "damage_detected": false,
      "wear_level": "low | medium | high",
      "cleanliness": "clean | dirty",
      "functionality": "functional | suspicious | damaged"
    },
    "text_content": "物品上的文字",
    "notes": "其他备注"
  },
  "image_analysis": {
    "image_quality": "high | medium | low",
    "lighting_condition": "good | fair | poor",
    "background_complexity": "simple | moderate | complex",
    "estimated_environment": "office | warehouse | lab | home | outdoor"
  },
  "recognition_summary": {
    "total_items_detected": 1,
    "primary_item": "主要物品名称",
    "requires_human_verification": false,
    "confidence_level": "high | medium | low"
  }
}

无法判断的字段填写 "unknown"；数组字段无法判断时返回 ["unknown"]。
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garment_prompt_names_every_schema_field() {
        for field in [
            "category",
            "item",
            "style_semantics",
            "season_semantics",
            "usage_semantics",
            "color_semantics",
            "description",
        ] {
            assert!(
                GARMENT_SEMANTIC_PROMPT.contains(&format!("\"{field}\"")),
                "prompt is missing {field}"
            );
        }
    }

    #[test]
    fn test_prompts_request_unknown_sentinel() {
        assert!(GARMENT_SEMANTIC_PROMPT.contains("\"unknown\""));
        assert!(ITEMS_ANALYZE_PROMPT.contains("\"unknown\""));
    }
}
