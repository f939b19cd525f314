use crate::models::{HerbIdentity, PatientProfile};

pub const REMEDY_SYSTEM_PROMPT: &str = "You are an experienced Ayurvedic practitioner with deep \
knowledge of traditional herbal medicine, herb preparation methods, and safe dosing practices. \
Provide accurate, safe, and traditional Ayurvedic guidance.";

pub const REMEDY_MAX_TOKENS: u32 = 1500;
pub const REMEDY_TEMPERATURE: f32 = 0.2;

/// Build the six-part remedy request for one herb and one condition.
pub fn build_remedy_prompt(
    identity: &HerbIdentity,
    profile: &PatientProfile,
    condition: &str,
) -> String {
    let herb = if identity.name.scientific.is_empty() {
        identity.name.common.clone()
    } else {
        format!("{} ({})", identity.name.common, identity.name.scientific)
    };

    format!(
        "As an expert in Ayurvedic medicine, create a comprehensive herbal remedy using {herb} to treat {condition}.

Patient Profile:
- Age: {age}
- Gender: {gender}
- Constitution: {constitution}

Please provide a detailed remedy including:

1. **Primary Preparation Method:**
   - How to prepare the herb (decoction, powder, paste, etc.)
   - Exact quantities and measurements
   - Preparation steps

2. **Dosage & Administration:**
   - Recommended dosage
   - Frequency (how many times per day)
   - Best time to take (before/after meals, morning/evening)
   - Duration of treatment

3. **Adjuvants & Enhancers:**
   - Other herbs or substances to combine with
   - Carrier substances (honey, ghee, warm water, etc.)

4. **Dietary Recommendations:**
   - Foods to include that support the treatment
   - Foods to avoid during treatment

5. **Precautions & Contraindications:**
   - Who should avoid this remedy
   - Potential side effects
   - Drug interactions if any

6. **Expected Results:**
   - Timeline for improvement
   - Signs of effectiveness

Ensure the remedy follows traditional Ayurvedic principles and is safe for the specified age and gender. Include relevant Sanskrit terms where appropriate.",
        condition = condition.trim(),
        age = profile.age_label(),
        gender = profile.gender_label(),
        constitution = profile.constitution_label(),
    )
}
