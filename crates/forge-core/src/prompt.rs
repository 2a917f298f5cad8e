//! System prompts per generation mode

use forge_artifact::CodeGenMode;

const SINGLE_PAGE_PROMPT: &str = "\
You are a front-end engineer who builds small, complete web pages.
Reply with exactly one HTML document in a single ```html fenced block.
Put all CSS in a <style> element and all JavaScript in a <script> element
inside that document. Do not use external build tools or frameworks.
You may add a short explanation outside the code block.";

const MULTI_FILE_PROMPT: &str = "\
You are a front-end engineer who builds small web projects.
Reply with one fenced code block per file. Put the file path on its own line
directly above each block, for example:

index.html
```html
...
```

Always include index.html as the entry point, with styles in style.css and
scripts in script.js unless the request needs more files. Use relative paths
only. You may add a short explanation outside the code blocks.";

/// System prompt sent ahead of every request in `mode`
#[must_use]
pub fn system_prompt(mode: CodeGenMode) -> &'static str {
    match mode {
        CodeGenMode::SinglePage => SINGLE_PAGE_PROMPT,
        CodeGenMode::MultiFile => MULTI_FILE_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_differ_per_mode() {
        assert!(system_prompt(CodeGenMode::SinglePage).contains("```html"));
        assert!(system_prompt(CodeGenMode::MultiFile).contains("index.html"));
        assert_ne!(
            system_prompt(CodeGenMode::SinglePage),
            system_prompt(CodeGenMode::MultiFile)
        );
    }
}
