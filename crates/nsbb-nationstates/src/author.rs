use nsbb_markup::escape_html;

/// Base of the nation profile links shown next to post authors.
pub const PROFILE_BASE_URL: &str = "https://nationstates.net";

/// Link to the author's nation, or nothing for users without one.
pub fn author_info_html(nation: Option<&str>) -> Option<String> {
    nation.map(|nation| {
        let nation = escape_html(nation);
        format!("<a href=\"{PROFILE_BASE_URL}/{nation}\">{nation}</a>")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_profile_link() {
        assert_eq!(
            author_info_html(Some("Testlandia")).as_deref(),
            Some("<a href=\"https://nationstates.net/Testlandia\">Testlandia</a>")
        );
        assert_eq!(
            author_info_html(Some("Great Britain")).as_deref(),
            Some("<a href=\"https://nationstates.net/Great Britain\">Great Britain</a>")
        );
    }

    #[test]
    fn nothing_without_nation() {
        assert_eq!(author_info_html(None), None);
    }
}
