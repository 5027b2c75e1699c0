use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn decision_path_does_not_write_feedback() {
    // Feedback is a separate, human-driven step owned by the caller.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let files = collect_rs_files(&src_root);
    assert!(!files.is_empty());

    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        assert!(
            !text.contains("lra_core::feedback"),
            "forbidden dependency found in {}",
            f.display()
        );
        assert!(
            !text.contains("FeedbackSink"),
            "feedback sink referenced in {}",
            f.display()
        );
    }
}

#[test]
fn network_access_stays_in_the_ollama_clients() {
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let allowed = ["ollama.rs", "ollama_embed.rs", "ollama_llm.rs"];

    for f in collect_rs_files(&src_root) {
        let name = f.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if allowed.contains(&name) {
            continue;
        }
        let text = fs::read_to_string(&f).unwrap_or_default();
        assert!(
            !text.contains("ureq::"),
            "HTTP client used outside the model boundary in {}",
            f.display()
        );
    }
}
