//! Advisory request builder
//!
//! The generation service has no way to enforce an output language or a
//! plain-text mode, so both constraints are stated in the prompt itself and
//! re-checked by the verifier.

use ecobot_core::LanguageEntry;

/// Build the four-section advisory instruction for one target language.
pub fn build_prompt(item: &str, lang: &LanguageEntry) -> String {
    let language = lang.display_name;
    format!(
        "You are a concise environmental e-waste expert. Provide only valuable, actionable \
information about this electronic item: {item}\n\
\n\
Write the entire answer exclusively in {language}. Every heading, label and sentence \
must be in {language}. Do not mix in words from any other language, and do not add \
a translation.\n\
\n\
1. Classification (one line each):\n\
   - Category\n\
   - Hazard level (1-5)\n\
   - Key components\n\
\n\
2. Management (concise steps):\n\
   - Best disposal method\n\
   - Top recycling option\n\
   - Manufacturer take-back program if available\n\
\n\
3. Environmental Impact (brief):\n\
   - Main environmental benefit of proper handling\n\
   - Primary toxic concern\n\
\n\
4. Key Advice (short points only):\n\
   - Essential safety tip\n\
   - Critical data-security tip if applicable\n\
\n\
Use plain, everyday vocabulary. Respond in clean plain text only: no markdown, no \
asterisks (*), no underscores (_), no pound signs (#), no bold or italic text and no \
decorative elements. Start each section with a clear plain heading in {language}. \
Be extremely concise, no filler text."
    )
}

/// Build the verification-pass instruction that re-asserts the target language.
pub fn translation_prompt(text: &str, lang: &LanguageEntry) -> String {
    let language = lang.display_name;
    format!(
        "Translate the following text strictly into {language}. If parts of it are already \
in {language}, keep them. The result must contain only {language}, with no words from \
any other language.\n\
Keep the same line structure and section order. Respond in plain text only: no markdown, \
no asterisks, no underscores, no notes or commentary, only the translated text.\n\
\n\
Text:\n\
{text}"
    )
}
