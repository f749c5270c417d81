/// Ninja variable line holding the compiler flags of a target.
pub const CFLAGS_PREFIX: &str = "cflags =";

/// Rewrite one `cflags =` line: add each `include` flag missing from its
/// space-separated tokens, then drop every `exclude` flag.
///
/// Other lines are returned untouched. Tokens are split on single spaces and
/// rejoined the same way, so spacing in the rest of the line survives.
pub fn patch_cflags_line(line: &str, include: &[&str], exclude: &[&str]) -> String {
    if !line.starts_with(CFLAGS_PREFIX) {
        return line.to_string();
    }

    let mut flags: Vec<&str> = line.split(' ').collect();
    for flag in include {
        if !flags.contains(flag) {
            flags.push(flag);
        }
    }
    flags.retain(|flag| !exclude.contains(flag));
    flags.join(" ")
}

/// Apply [`patch_cflags_line`] to every `\n`-separated line.
pub fn patch_cflags_text(content: &str, include: &[&str], exclude: &[&str]) -> String {
    content
        .split('\n')
        .map(|line| patch_cflags_line(line, include, exclude))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_appended_in_order() {
        let patched = patch_cflags_line("cflags = -O2", &["-Wa", "-Wb"], &[]);
        assert_eq!(patched, "cflags = -O2 -Wa -Wb");
    }

    #[test]
    fn test_present_flag_not_duplicated() {
        let patched = patch_cflags_line("cflags = -Wb -O2", &["-Wa", "-Wb"], &[]);
        assert_eq!(patched, "cflags = -Wb -O2 -Wa");
    }

    #[test]
    fn test_excluded_flag_removed() {
        let patched = patch_cflags_line("cflags = -Werror -O2 -Werror", &[], &["-Werror"]);
        assert_eq!(patched, "cflags = -O2");
    }

    #[test]
    fn test_prefix_must_lead() {
        let line = "  cflags = -Werror";
        assert_eq!(patch_cflags_line(line, &["-Wa"], &["-Werror"]), line);
        let line = "cflags_cc = -Werror";
        assert_eq!(patch_cflags_line(line, &["-Wa"], &["-Werror"]), line);
    }

    #[test]
    fn test_text_keeps_other_lines() {
        let input = "rule cxx\ncflags = -O2\nbuild a.o: cxx a.cc\n";
        let expected = "rule cxx\ncflags = -O2 -Wa\nbuild a.o: cxx a.cc\n";
        assert_eq!(patch_cflags_text(input, &["-Wa"], &[]), expected);
    }
}
