use super::attachments::DecodedAttachment;

/// Builds the single prompt sent to the model for a task.
pub fn build_prompt(
    task_id: &str,
    brief: &str,
    checks: &[String],
    attachments: &[DecodedAttachment],
) -> String {
    let checks_text = checks
        .iter()
        .map(|check| format!("- {}", check))
        .collect::<Vec<_>>()
        .join("\n");

    let attachments_text = if attachments.is_empty() {
        String::new()
    } else {
        let mut text = String::from("\n\n**Attached files:**\n");
        for attachment in attachments {
            text.push_str(&format!(
                "\n--- {} ---\n{}\n--- end of {} ---\n",
                attachment.name, attachment.content, attachment.name
            ));
        }
        text
    };

    format!(
        r#"You are an expert web developer. Build a complete, production-ready single-page web application that satisfies the requirements below.

**Task ID:** {task_id}

**Brief:**
{brief}

**The application must pass these checks:**
{checks_text}{attachments_text}

**Requirements:**
1. Deliver everything in one self-contained `index.html` with embedded CSS and JavaScript; there is no build step.
2. Load third-party libraries from a CDN only (no npm or bundlers).
3. Style it professionally with Bootstrap 5.
4. Implement everything needed to pass every check listed above.
5. Handle edge cases and errors gracefully.
6. Comment the key sections of the code.
7. If files are attached, use or embed them as the brief requires; they will be published next to `index.html` under the same names.

**Constraints:**
- Do NOT use localStorage, sessionStorage or any other browser-persistent storage.
- Keep all state in in-memory JavaScript variables.
- All functionality must work from the single HTML file.

Also write `README.md` with:
- Project summary
- Setup instructions
- Usage guide
- Code explanation
- License section (MIT)

Format your answer exactly like this:

### index.html
```html
[complete HTML here]
```

### README.md
```markdown
[complete README here]
```
"#
    )
}
