pub const EDIT_REMOVE_BACKGROUND: &str = include_str!("../data/prompts/edit_remove_background.txt");
pub const EDIT_COLOR_CORRECT: &str = include_str!("../data/prompts/edit_color_correct.txt");
pub const EDIT_REMOVE_OBJECT: &str = include_str!("../data/prompts/edit_remove_object.txt");
pub const EDIT_STYLE_FILTER: &str = include_str!("../data/prompts/edit_style_filter.txt");
pub const EDIT_TEXT_PROMPT: &str = "{{text}}";
pub const ANALYSIS_USER: &str = include_str!("../data/prompts/analysis_user.txt");
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");

/// Instruction template per quick-tool id.
pub const EDIT_TOOLS: &[(&str, &str)] = &[
    ("remove-bg", EDIT_REMOVE_BACKGROUND),
    ("color-correct", EDIT_COLOR_CORRECT),
    ("remove-object", EDIT_REMOVE_OBJECT),
    ("style-filter", EDIT_STYLE_FILTER),
    ("text-prompt", EDIT_TEXT_PROMPT),
];

/// Style filters offered by the editor: (style sent to the model, label).
pub const STYLE_FILTERS: &[(&str, &str)] = &[
    ("cartoon", "Cartoon"),
    ("watercolor painting", "Watercolor"),
    ("cyberpunk", "Cyberpunk"),
    ("pencil sketch", "Sketch"),
    ("pop art", "Pop Art"),
];

pub fn edit_template(tool_id: &str) -> Option<&'static str> {
    EDIT_TOOLS
        .iter()
        .find(|(id, _)| *id == tool_id)
        .map(|(_, template)| *template)
}

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
