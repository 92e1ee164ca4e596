//! Unit tests for the escape normalizer

use agentterm::normalize;

#[cfg(test)]
mod normalize_tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(normalize("hello world"), "hello world");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_strips_color_sequences() {
        assert_eq!(normalize("\x1b[31mred\x1b[0m and \x1b[1;32mgreen\x1b[0m"), "red and green");
    }

    #[test]
    fn test_strips_cursor_movement() {
        assert_eq!(normalize("\x1b[2J\x1b[Hcleared"), "cleared");
        assert_eq!(normalize("\x1b[10;20Hplaced"), "placed");
    }

    #[test]
    fn test_strips_osc_with_bel_terminator() {
        assert_eq!(normalize("\x1b]0;my window title\x07$ "), "$ ");
    }

    #[test]
    fn test_strips_osc_with_st_terminator() {
        assert_eq!(normalize("\x1b]8;;https://example.com\x1b\\text"), "text");
    }

    #[test]
    fn test_strips_bracketed_paste_modes() {
        assert_eq!(normalize("\x1b[?2004hready\x1b[?2004l"), "ready");
    }

    #[test]
    fn test_strips_orphan_bracket_remnants() {
        // ESC stripped upstream, leaving bare bracket sequences behind
        assert_eq!(normalize("[?2004hprompt"), "prompt");
        assert_eq!(normalize("[?25ldone[?25h"), "done");
    }

    #[test]
    fn test_orphan_cursor_forward_becomes_space() {
        assert_eq!(normalize("col1[5Ccol2"), "col1 col2");
    }

    #[test]
    fn test_removes_carriage_returns() {
        assert_eq!(normalize("progress\rdone\r\n"), "progressdone\n");
    }

    #[test]
    fn test_preserves_newlines_and_tabs() {
        assert_eq!(normalize("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn test_removes_other_control_characters() {
        assert_eq!(normalize("a\x07b\x08c\x00d"), "abcd");
    }

    #[test]
    fn test_collapses_space_runs() {
        assert_eq!(normalize("total        48"), "total 48");
        assert_eq!(normalize("one two"), "one two");
    }

    #[test]
    fn test_multibyte_content_preserved() {
        assert_eq!(normalize("\x1b[35mcafé ❯ naïve\x1b[0m"), "café ❯ naïve");
    }

    #[test]
    fn test_idempotent_on_realistic_prompt() {
        let raw = "\x1b]0;user@host\x07\x1b[1;32muser\x1b[0m \x1b[34m~/src\x1b[0m % ls   -la\r\n[?2004h";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
        assert_eq!(once, "user ~/src % ls -la\n");
    }

    #[test]
    fn test_sequence_split_at_chunk_boundary_is_not_reconstructed() {
        // Stateless by design: the two halves of ESC[31m fed separately leave
        // different residue than the whole sequence would.
        let whole = normalize("\x1b[31mred");
        let mut split = normalize("\x1b[3");
        split.push_str(&normalize("1mred"));
        assert_eq!(whole, "red");
        assert_ne!(split, whole);
    }

    #[test]
    fn test_trailing_incomplete_csi_fragment_removed() {
        assert_eq!(normalize("output\x1b[0;3"), "output");
    }
}
