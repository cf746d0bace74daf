// src/message.rs

const SIGN_OFF: &str = "Signed-off-by: ";

/// Drops sign-off trailers and blank lines from a commit body.
pub fn process_commit_body(body: &str) -> String {
    body.split('\n')
        .filter(|line| !line.starts_with(SIGN_OFF))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sign_off_and_blank_lines() {
        let body = "Fix the widget\n\nIt was broken.\n   \nSigned-off-by: Dev <dev@example.com>\n";
        assert_eq!(process_commit_body(body), "Fix the widget\nIt was broken.");
    }

    #[test]
    fn keeps_indentation_of_inner_lines() {
        let body = "  first\n    - nested\nlast  ";
        assert_eq!(process_commit_body(body), "first\n    - nested\nlast");
    }

    #[test]
    fn only_trailers_leaves_nothing() {
        assert_eq!(process_commit_body("Signed-off-by: A <a@b>\n\n"), "");
    }

    #[test]
    fn sign_off_must_start_the_line() {
        assert_eq!(process_commit_body("See Signed-off-by: rules"), "See Signed-off-by: rules");
    }
}
