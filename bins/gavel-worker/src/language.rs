// Per-language execution data. Each language contributes only its source
// file name, an optional compile argv, and a run argv; the executor state
// machine is identical for all of them. Adding a language means adding a
// variant here and nothing else.

use std::path::Path;

/// Name of the compiled artifact inside a workspace.
const ARTIFACT: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Java,
    Cpp,
    C,
    Go,
}

impl Language {
    /// Fallback for unrecognized language tags. Favors availability over
    /// strict validation; callers log the substitution.
    pub const DEFAULT: Language = Language::Python;

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "python" => Some(Language::Python),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            "c" => Some(Language::C),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
        }
    }

    /// File name the submitted code is written under. Java requires the
    /// class-mandated `Main.java`.
    pub fn source_file(self) -> &'static str {
        match self {
            Language::Python => "main.py",
            Language::Java => "Main.java",
            Language::Cpp => "main.cpp",
            Language::C => "main.c",
            Language::Go => "main.go",
        }
    }

    /// Compiler invocation for this language, or `None` for interpreted
    /// languages. The toolchain is resolved from the host PATH.
    pub fn compile_command(self, workspace: &Path) -> Option<Vec<String>> {
        let source = path_str(workspace, self.source_file());
        let binary = path_str(workspace, ARTIFACT);

        match self {
            Language::Python => None,
            Language::Java => Some(vec!["javac".into(), source]),
            Language::Cpp => Some(vec![
                "g++".into(),
                "-O2".into(),
                "-std=c++17".into(),
                source,
                "-o".into(),
                binary,
            ]),
            Language::C => Some(vec![
                "gcc".into(),
                "-O2".into(),
                source,
                "-o".into(),
                binary,
            ]),
            Language::Go => Some(vec!["go".into(), "build".into(), "-o".into(), binary, source]),
        }
    }

    /// Invocation for one test-case run: interpreter plus source path, or
    /// the compiled artifact with no arguments.
    pub fn run_command(self, workspace: &Path) -> Vec<String> {
        match self {
            Language::Python => vec!["python3".into(), path_str(workspace, self.source_file())],
            Language::Java => vec![
                "java".into(),
                "-cp".into(),
                workspace.to_string_lossy().into_owned(),
                "Main".into(),
            ],
            Language::Cpp | Language::C | Language::Go => vec![path_str(workspace, ARTIFACT)],
        }
    }
}

fn path_str(dir: &Path, file: &str) -> String {
    dir.join(file).to_string_lossy().into_owned()
}
