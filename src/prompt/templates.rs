//! Embedded prompt templates.
//!
//! `generate_*` drive the first attempt, `fix_*` every retry. Each can be
//! overridden by a `<name>.md` file in the configured templates directory.

pub const GENERATE_SYSTEM: &str = "generate_system";
pub const GENERATE_USER: &str = "generate_user";
pub const FIX_SYSTEM: &str = "fix_system";
pub const FIX_USER: &str = "fix_user";

pub const TEMPLATE_NAMES: &[&str] = &[GENERATE_SYSTEM, GENERATE_USER, FIX_SYSTEM, FIX_USER];

const GENERATE_SYSTEM_TEXT: &str = "You are an expert Python programmer specializing in \
parsing complex PDF documents, especially bank statements. Your task is to write a COMPLETE \
Python module that adheres to a strict contract.";

const GENERATE_USER_TEXT: &str =
    r#"Generate the full Python code for a parser file named '{{source_file}}'.

**The parser MUST contain a single entry point:**
```python
def {{entry_point}}(pdf_path: str) -> pd.DataFrame:
    # Your implementation here
```

**Contract Details:**
1. The output must be a pandas DataFrame (`pd.DataFrame`).
2. The DataFrame must have exactly these columns, in this order, with {{expected_rows}} rows:
{{#each columns}}
   - `{{name}}` ({{kind}})
{{/each}}
3. You MUST include `import pandas as pd` and any other necessary imports (like `pdfplumber`).
4. Keep the rows in the order they appear in the document.

**Document Context (First Page):**
Use the following text extracted from '{{input_path}}' to understand the data layout:
--- DOCUMENT TEXT START ---
{{input_preview}}
--- DOCUMENT TEXT END ---

**Instructions:**
1. Do not use any external tools.
2. Return ONLY the complete, correct Python code within one fenced block (```python ... ```)."#;

const FIX_SYSTEM_TEXT: &str = "You are an expert debugging agent. Your previous code failed \
the test. Analyze the provided test feedback (error messages, table mismatches) and generate \
the COMPLETE, CORRECTED Python code for the parser file. Do not explain your reasoning; return \
ONLY the code.";

const FIX_USER_TEXT: &str = r#"The previous code (attempt {{attempt}}) was:

```python
{{previous_source}}
```

**TEST FEEDBACK (CRITICAL):**
The test failed with the following feedback. Use this information to fix the code:

--- FEEDBACK START ---
{{feedback}}
--- FEEDBACK END ---

**Expected columns, in order ({{expected_rows}} rows):**
{{#each columns}}
- `{{name}}` ({{kind}})
{{/each}}

**Instructions:**
1. Generate the COMPLETE, CORRECTED Python code, keeping the `{{entry_point}}(pdf_path)` contract.
2. Return ONLY the complete, corrected code within one fenced block (```python ... ```)."#;

/// Built-in text for a template name
pub fn embedded(name: &str) -> Option<&'static str> {
    match name {
        GENERATE_SYSTEM => Some(GENERATE_SYSTEM_TEXT),
        GENERATE_USER => Some(GENERATE_USER_TEXT),
        FIX_SYSTEM => Some(FIX_SYSTEM_TEXT),
        FIX_USER => Some(FIX_USER_TEXT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_has_embedded_text() {
        for name in TEMPLATE_NAMES {
            assert!(embedded(name).is_some(), "missing template {}", name);
        }
        assert!(embedded("nope").is_none());
    }
}
