/// Instruction sent alongside the image. The worked example pins the labeled
/// output format the extractor's first strategy looks for.
pub const IDENTIFICATION_PROMPT: &str = "\
Analyze this image and identify the herb, plant, or botanical item shown.

Please provide the response in this exact format:

HERB NAME: [Common name of the herb/plant]
SCIENTIFIC NAME: [Scientific/botanical name if recognizable]
SANSKRIT NAME: [Sanskrit name used in Ayurveda, if known]
CONFIDENCE: [Your confidence level from 1-100]
DESCRIPTION: [Brief description of what you see - color, form, parts visible]
AYURVEDIC PROPERTIES: [If known - rasa, virya, vipaka, prabhava]

Example:
HERB NAME: Turmeric
SCIENTIFIC NAME: Curcuma longa
SANSKRIT NAME: Haridra
CONFIDENCE: 95
DESCRIPTION: Yellow-orange rhizome powder
AYURVEDIC PROPERTIES: Rasa: Tikta, Katu; Virya: Ushna; Vipaka: Katu

Focus on identifying medicinal herbs, spices, or plant materials commonly used in traditional medicine.";

/// Deterministic settings: identification should not be creative.
pub const IDENTIFICATION_TEMPERATURE: f32 = 0.1;
pub const IDENTIFICATION_MAX_TOKENS: u32 = 512;
