use serde::Deserialize;

/// Body of `action=parse&prop=wikitext&formatversion=2`.
#[derive(Deserialize, Debug)]
pub struct ParseResponse {
    pub parse: Option<ParsedPage>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
pub struct ParsedPage {
    pub title: String,
    pub wikitext: String,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_page_and_error_bodies() {
        let ok: ParseResponse = serde_json::from_str(
            r#"{"parse":{"title":"List of most-visited museums","pageid":1,"wikitext":"{|\n|}"}}"#,
        )
        .unwrap();
        let page = ok.parse.unwrap();
        assert_eq!(page.title, "List of most-visited museums");
        assert_eq!(page.wikitext, "{|\n|}");
        assert!(ok.error.is_none());

        let err: ParseResponse = serde_json::from_str(
            r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#,
        )
        .unwrap();
        assert!(err.parse.is_none());
        assert_eq!(err.error.unwrap().code, "missingtitle");
    }
}
