//! Unit tests for the line segmenter and command/output extractor

use agentterm::LineSegmenter;

#[cfg(test)]
mod segmenter_tests {
    use super::*;

    fn segmenter() -> LineSegmenter {
        LineSegmenter::new("claude").expect("segmenter")
    }

    #[test]
    fn test_zsh_prompt_command_and_output() {
        let mut seg = segmenter();
        let out = seg.feed("mac ~/src % ls -la\ntotal 48\ndrwxr-xr-x .\nmac ~/src % \n");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].command, "ls -la");
        assert_eq!(out.entries[0].output, "total 48\ndrwxr-xr-x .");
        assert!(!out.entries[0].is_error);
    }

    #[test]
    fn test_marker_prompt_recognized() {
        let mut seg = segmenter();
        let out = seg.feed("❯ git status\nclean\n❯ \n");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].command, "git status");
    }

    #[test]
    fn test_dollar_and_hash_prompts() {
        let mut seg = segmenter();
        let out = seg.feed("$ whoami\nuser\n# id\nuid=0\n$ \n");
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.entries[0].command, "whoami");
        assert_eq!(out.entries[1].command, "id");
        assert_eq!(out.entries[1].output, "uid=0");
    }

    #[test]
    fn test_empty_output_substitution() {
        let mut seg = segmenter();
        let out = seg.feed("$ cd /tmp\n$ next\n");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].output, "(no output)");
    }

    #[test]
    fn test_error_detection_is_case_insensitive() {
        let mut seg = segmenter();
        let out = seg.feed("$ build\nERROR: linking Failed\n$ \n");
        assert_eq!(out.entries.len(), 1);
        assert!(out.entries[0].is_error);

        let out = seg.feed("$ which foo\nfoo Not Found\n$ \n");
        assert!(out.entries[0].is_error);
    }

    #[test]
    fn test_output_before_any_prompt_is_dropped() {
        let mut seg = segmenter();
        // Banner output with no open record has no command to attach to
        let out = seg.feed("Last login: today\n$ pwd\n/home\n$ \n");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].command, "pwd");
        assert_eq!(out.entries[0].output, "/home");
    }

    #[test]
    fn test_unterminated_line_carried_to_next_feed() {
        let mut seg = segmenter();
        assert!(seg.feed("$ echo par").entries.is_empty());
        let out = seg.feed("tial\nresult\n$ \n");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].command, "echo partial");
        assert_eq!(out.entries[0].output, "result");
    }

    #[test]
    fn test_unicode_whitespace_trimmed() {
        let mut seg = segmenter();
        let out = seg.feed("$ date\u{00A0}\n\u{202F}Mon Jan 1\u{2007}\n$ \n");
        assert_eq!(out.entries[0].command, "date");
        assert_eq!(out.entries[0].output, "Mon Jan 1");
    }

    #[test]
    fn test_resume_token_reported_exactly_once() {
        let mut seg = segmenter();
        let out =
            seg.feed("hint: claude --resume 123e4567-e89b-12d3-a456-426614174000 to continue\n");
        assert_eq!(
            out.resume_tokens,
            vec!["123e4567-e89b-12d3-a456-426614174000".to_string()]
        );
    }

    #[test]
    fn test_resume_token_found_inside_command_output() {
        let mut seg = segmenter();
        let out = seg.feed(
            "$ claude --help\nusage:\n  claude --resume 123e4567-e89b-12d3-a456-426614174000\n$ \n",
        );
        assert_eq!(out.resume_tokens.len(), 1);
        assert_eq!(out.entries.len(), 1);
    }

    #[test]
    fn test_near_miss_token_lengths_rejected() {
        let mut seg = segmenter();
        // 35 characters
        let out = seg.feed("claude --resume 123e4567-e89b-12d3-a456-42661417400\n");
        assert!(out.resume_tokens.is_empty());
        // 37 characters
        let out = seg.feed("claude --resume 123e4567-e89b-12d3-a456-4266141740001\n");
        assert!(out.resume_tokens.is_empty());
    }

    #[test]
    fn test_other_verbs_do_not_match() {
        let mut seg = segmenter();
        let out = seg.feed("other --resume 123e4567-e89b-12d3-a456-426614174000\n");
        assert!(out.resume_tokens.is_empty());
    }

    #[test]
    fn test_flush_finalizes_open_record_once() {
        let mut seg = segmenter();
        seg.feed("$ tail -f log\nline one\nline two\n");
        let entry = seg.flush().expect("open record");
        assert_eq!(entry.command, "tail -f log");
        assert_eq!(entry.output, "line one\nline two");
        assert!(seg.flush().is_none());
    }

    #[test]
    fn test_reset_discards_without_emitting() {
        let mut seg = segmenter();
        seg.feed("$ long-running\nhalf of the out");
        seg.reset();
        assert!(seg.flush().is_none());
        // Fresh state afterwards
        let out = seg.feed("$ ls\nok\n$ \n");
        assert_eq!(out.entries.len(), 1);
    }

    #[test]
    fn test_chunked_equals_whole() {
        let text = "mac ~ % echo hi\nhi\nmac ~ % cat missing\ncat: missing: No such file\nmac ~ % \n";
        let mut whole = segmenter();
        let whole_out = whole.feed(text);

        let mut chunked = segmenter();
        let mut chunked_entries = Vec::new();
        for chunk in text.as_bytes().chunks(3) {
            let piece = std::str::from_utf8(chunk).expect("ascii text");
            chunked_entries.extend(chunked.feed(piece).entries);
        }

        let summarize = |entries: &[agentterm::TerminalEntry]| {
            entries
                .iter()
                .map(|e| (e.command.clone(), e.output.clone(), e.is_error))
                .collect::<Vec<_>>()
        };
        assert_eq!(summarize(&whole_out.entries), summarize(&chunked_entries));
        assert_eq!(whole_out.entries.len(), 2);
    }
}
