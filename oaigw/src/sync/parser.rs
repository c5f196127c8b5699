//! モデル一覧レスポンスパーサー
//!
//! OpenAI形式とOllama形式の両方をパース

/// レスポンスの形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// OpenAI形式: `{"data": [...]}`
    OpenAi,
    /// Ollama形式: `{"models": [...]}`
    Ollama,
    /// 不明な形式
    Unknown,
}

/// JSONレスポンスをパースしてモデルID一覧を抽出
///
/// OpenAI形式とOllama形式の両方に対応。IDが空の要素は捨てる。
///
/// # Examples
///
/// ```
/// use oaigw::sync::parser::{parse_models_response, ResponseFormat};
///
/// let json = serde_json::json!({"data": [{"id": "gpt-4"}, {"id": "gpt-3.5-turbo"}]});
/// let (models, format) = parse_models_response(&json);
/// assert_eq!(models, vec!["gpt-4", "gpt-3.5-turbo"]);
/// assert_eq!(format, ResponseFormat::OpenAi);
///
/// let json = serde_json::json!({"models": [{"name": "llama3"}, {"model": "mistral"}]});
/// let (models, format) = parse_models_response(&json);
/// assert_eq!(models, vec!["llama3", "mistral"]);
/// assert_eq!(format, ResponseFormat::Ollama);
/// ```
pub fn parse_models_response(json: &serde_json::Value) -> (Vec<String>, ResponseFormat) {
    // OpenAI形式を試す
    if let Some(data) = json.get("data").and_then(|d| d.as_array()) {
        let models = data
            .iter()
            .filter_map(|model| model.get("id").and_then(|id| id.as_str()))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        return (models, ResponseFormat::OpenAi);
    }

    // Ollama形式を試す
    if let Some(models_array) = json.get("models").and_then(|m| m.as_array()) {
        let models = models_array
            .iter()
            .filter_map(|model| {
                // nameを優先、なければmodelを使用
                model
                    .get("name")
                    .and_then(|n| n.as_str())
                    .or_else(|| model.get("model").and_then(|m| m.as_str()))
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string)
            .collect();
        return (models, ResponseFormat::Ollama);
    }

    (Vec::new(), ResponseFormat::Unknown)
}
