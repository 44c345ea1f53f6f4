//! Answering prompt and generation parameters sent upstream.

/// Sampling temperature for document answers.
pub const TEMPERATURE: f64 = 0.3;

/// Nucleus sampling probability mass.
pub const TOP_P: f64 = 0.9;

/// Upper bound on generated tokens per answer.
pub const MAX_OUTPUT_TOKENS: i32 = 500;

/// Generation parameters attached to every upstream request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: i32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// Build the answering prompt around page-tagged document text and the
/// user's question.
///
/// Both inputs are substituted verbatim. Nothing is escaped, so a document
/// or question containing the `---` delimiter or a quote can reshape the
/// prompt.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Sen, bir PDF belgesi hakkında soruları yanıtlayan bir asistansın.\n\
         Sana aşağıda sayfa numaralarıyla etiketlenmiş belge içeriği verilecek.\n\
         Kullanıcının sorusunu bu içeriğe dayanarak yanıtla.\n\
         Yanıtların kısa ve öz olsun. Mümkünse, cevabın bulunduğu sayfa numarasını belirt (örneğin, \"[Sayfa 5]'e göre...\").\n\
         Eğer cevap belgede yoksa, \"Bu bilgi belgede bulunmuyor.\" de.\n\
         \n\
         BELGE İÇERİĞİ:\n\
         ---\n\
         {context}\n\
         ---\n\
         \n\
         KULLANICI SORUSU: \"{query}\"\n\
         \n\
         YANITIN:"
    )
}
