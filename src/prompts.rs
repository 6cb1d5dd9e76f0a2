pub const TEXT_INSTRUCTION: &str = include_str!("../data/prompts/text_instruction.txt");
pub const IMAGE_INSTRUCTION: &str = include_str!("../data/prompts/image_instruction.txt");

pub const PROBLEM_LABEL: &str = "Problem:";
pub const CONTEXT_LABEL: &str = "Additional context:";
