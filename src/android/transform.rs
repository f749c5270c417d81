/// Calls with no Android counterpart, and their replacements.
pub const TOKEN_MAP: [(&str, &str); 1] = [(".getParameterCount()", ".getParameterTypes().length")];

/// Imports of APIs Android lacks.
pub const COMMENTED_IMPORTS: [&str; 8] = [
    "import javax.management.ListenerNotFoundException;",
    "import javax.management.Notification;",
    "import javax.management.NotificationEmitter;",
    "import javax.management.NotificationListener;",
    "import java.lang.management.ManagementFactory;",
    "import java.lang.management.MemoryNotificationInfo;",
    "import java.lang.management.MemoryPoolMXBean;",
    "import java.lang.management.MemoryType;",
];

/// Opens an Android-only block that is commented out in the canonical tree.
pub const IF_DEFINED_ANDROID: &str = "/* if defined ANDROID";
/// Closes a non-Android block; trimming ` */` turns it into an open comment.
pub const IF_NOT_DEFINED_ANDROID: &str = "/* if not defined ANDROID */";

const CLOSE_COMMENT: &str = " */";

/// Rewrite one canonical source line for the Android mirror.
///
/// Lines are independent: a marker only affects the line it ends.
pub fn transform_line(line: &str) -> String {
    let mut line = line.to_string();

    for (from, to) in TOKEN_MAP {
        if line.contains(from) {
            line = line.replace(from, to);
        }
    }

    if COMMENTED_IMPORTS.iter().any(|import| line.contains(import)) {
        line.insert_str(0, "// ");
    }

    if line.ends_with(IF_DEFINED_ANDROID) {
        line.push_str(CLOSE_COMMENT);
    }
    if line.ends_with(IF_NOT_DEFINED_ANDROID) {
        line.truncate(line.len() - CLOSE_COMMENT.len());
    }

    line
}

pub fn transform_source(content: &str) -> String {
    content
        .split('\n')
        .map(transform_line)
        .collect::<Vec<_>>()
        .join("\n")
}
