//! Built-in curated model list
//!
//! A hand-maintained snapshot of well-regarded GGUF releases across the
//! supported categories. Sizes are the published Q4_K_M artifact sizes.
//! Records without a source repo are sharded releases that must be pulled
//! through a runtime's own downloader.

use super::types::{ModelCategory, ModelRecord};
use std::collections::BTreeSet;

struct Entry {
    id: &'static str,
    name: &'static str,
    params: &'static str,
    quant: &'static str,
    size_gb: f64,
    context_tokens: u32,
    score: u8,
    category: ModelCategory,
    license: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    best_for: &'static str,
    repo: Option<&'static str>,
    file: Option<&'static str>,
}

const ENTRIES: &[Entry] = &[
    Entry {
        id: "qwen3-32b",
        name: "Qwen3-32B",
        params: "32B",
        quant: "Q4_K_M",
        size_gb: 20.5,
        context_tokens: 128_000,
        score: 95,
        category: ModelCategory::GeneralPurpose,
        license: "Apache 2.0",
        description: "Top-tier open model. Thinking + non-thinking modes, tool use, multilingual.",
        tags: &["Thinking", "Multilingual", "Tool Use"],
        best_for: "Best overall open model",
        repo: Some("unsloth/Qwen3-32B-GGUF"),
        file: Some("Qwen3-32B-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-8b",
        name: "Qwen3-8B",
        params: "8B",
        quant: "Q4_K_M",
        size_gb: 5.2,
        context_tokens: 128_000,
        score: 89,
        category: ModelCategory::GeneralPurpose,
        license: "Apache 2.0",
        description: "Best 8B model. Thinking mode, 128K context, multilingual.",
        tags: &["Thinking", "Multilingual", "Efficient"],
        best_for: "Best 8B all-rounder",
        repo: Some("Qwen/Qwen3-8B-GGUF"),
        file: Some("Qwen3-8B-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-4b",
        name: "Qwen3-4B",
        params: "4B",
        quant: "Q4_K_M",
        size_gb: 2.9,
        context_tokens: 128_000,
        score: 82,
        category: ModelCategory::SmallEfficient,
        license: "Apache 2.0",
        description: "Tiny but capable. Thinking mode in 3GB, good for low VRAM or fast responses.",
        tags: &["Thinking", "Tiny", "Fast"],
        best_for: "Best ultra-small model",
        repo: Some("Qwen/Qwen3-4B-GGUF"),
        file: Some("Qwen3-4B-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-30b-a3b",
        name: "Qwen3-30B-A3B",
        params: "30B (3B active)",
        quant: "Q4_K_M",
        size_gb: 18.4,
        context_tokens: 128_000,
        score: 91,
        category: ModelCategory::GeneralPurpose,
        license: "Apache 2.0",
        description: "MoE: 30B total, only 3B active per token. Near-32B quality at a fraction of compute.",
        tags: &["MoE", "Thinking", "Efficient"],
        best_for: "Best MoE efficiency",
        repo: Some("unsloth/Qwen3-30B-A3B-GGUF"),
        file: Some("Qwen3-30B-A3B-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-235b-a22b",
        name: "Qwen3-235B-A22B",
        params: "235B (22B active)",
        quant: "Q4_K_M",
        size_gb: 130.0,
        context_tokens: 128_000,
        score: 97,
        category: ModelCategory::GeneralPurpose,
        license: "Apache 2.0",
        description: "Largest open model. Sharded multi-file GGUF, pull through a runtime.",
        tags: &["MoE", "Frontier", "Thinking"],
        best_for: "Most intelligent open model",
        repo: None,
        file: None,
    },
    Entry {
        id: "deepseek-r1-14b",
        name: "DeepSeek-R1-14B",
        params: "14B",
        quant: "Q4_K_M",
        size_gb: 8.9,
        context_tokens: 64_000,
        score: 88,
        category: ModelCategory::GeneralPurpose,
        license: "MIT",
        description: "Distilled reasoning from DeepSeek-R1. Strong chain-of-thought, math, logic.",
        tags: &["Reasoning", "CoT", "Math"],
        best_for: "Best reasoning at size",
        repo: Some("bartowski/DeepSeek-R1-Distill-Qwen-14B-GGUF"),
        file: Some("DeepSeek-R1-Distill-Qwen-14B-Q4_K_M.gguf"),
    },
    Entry {
        id: "gemma-3-27b",
        name: "Gemma-3-27B",
        params: "27B",
        quant: "Q4_K_M",
        size_gb: 17.3,
        context_tokens: 128_000,
        score: 90,
        category: ModelCategory::GeneralPurpose,
        license: "Gemma",
        description: "Google's best open model. Excellent instruction following and multilingual.",
        tags: &["Google", "Multilingual", "Instruct"],
        best_for: "Google's strongest open model",
        repo: Some("unsloth/gemma-3-27b-it-GGUF"),
        file: Some("gemma-3-27b-it-Q4_K_M.gguf"),
    },
    Entry {
        id: "mistral-small-24b",
        name: "Mistral-Small-24B",
        params: "24B",
        quant: "Q4_K_M",
        size_gb: 14.5,
        context_tokens: 32_000,
        score: 87,
        category: ModelCategory::GeneralPurpose,
        license: "Apache 2.0",
        description: "Mistral's compact powerhouse. Function calling, structured output.",
        tags: &["Function Calling", "JSON", "Instruct"],
        best_for: "Best structured output",
        repo: Some("bartowski/Mistral-Small-24B-Instruct-2501-GGUF"),
        file: Some("Mistral-Small-24B-Instruct-2501-Q4_K_M.gguf"),
    },
    Entry {
        id: "llama-4-scout",
        name: "Llama-4-Scout",
        params: "109B (17B active)",
        quant: "Q4_K_M",
        size_gb: 63.8,
        context_tokens: 512_000,
        score: 89,
        category: ModelCategory::LongContext,
        license: "Llama 4",
        description: "Meta's MoE with an extreme context window. Sharded GGUF, pull through a runtime.",
        tags: &["MoE", "Long Context", "Meta"],
        best_for: "Longest context window",
        repo: None,
        file: None,
    },
    Entry {
        id: "qwen2.5-coder-32b",
        name: "Qwen2.5-Coder-32B",
        params: "32B",
        quant: "Q4_K_M",
        size_gb: 20.3,
        context_tokens: 128_000,
        score: 93,
        category: ModelCategory::Coding,
        license: "Apache 2.0",
        description: "Top coding model, full-stack, strong on coding benchmarks.",
        tags: &["Coding", "Full-Stack", "128K"],
        best_for: "Best open code model",
        repo: Some("bartowski/Qwen2.5-Coder-32B-Instruct-GGUF"),
        file: Some("Qwen2.5-Coder-32B-Instruct-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-coder-30b-a3b",
        name: "Qwen3-Coder-30B-A3B",
        params: "30B (3B active)",
        quant: "Q4_K_M",
        size_gb: 18.4,
        context_tokens: 128_000,
        score: 91,
        category: ModelCategory::Coding,
        license: "Apache 2.0",
        description: "MoE coding specialist. Agentic coding, tool use, thinking mode.",
        tags: &["Coding", "MoE", "Agentic"],
        best_for: "Best MoE coder",
        repo: Some("unsloth/Qwen3-Coder-30B-A3B-Instruct-GGUF"),
        file: Some("Qwen3-Coder-30B-A3B-Instruct-Q4_K_M.gguf"),
    },
    Entry {
        id: "devstral-small-24b",
        name: "Devstral-Small-24B",
        params: "24B",
        quant: "Q4_K_M",
        size_gb: 14.5,
        context_tokens: 128_000,
        score: 88,
        category: ModelCategory::Coding,
        license: "Apache 2.0",
        description: "Mistral's agentic coding model. SWE-bench leader, tool use.",
        tags: &["Coding", "Agentic", "SWE-bench"],
        best_for: "Best agentic coder",
        repo: Some("unsloth/Devstral-Small-2-24B-Instruct-2512-GGUF"),
        file: Some("Devstral-Small-2-24B-Instruct-2512-Q4_K_M.gguf"),
    },
    Entry {
        id: "phi-4-mini",
        name: "Phi-4-Mini",
        params: "3.8B",
        quant: "Q4_K_M",
        size_gb: 2.5,
        context_tokens: 128_000,
        score: 83,
        category: ModelCategory::SmallEfficient,
        license: "MIT",
        description: "Microsoft's tiny powerhouse. Strong reasoning for its size, STEM focus.",
        tags: &["Tiny", "STEM", "Microsoft"],
        best_for: "Best tiny STEM model",
        repo: Some("MaziyarPanahi/Phi-4-mini-instruct-GGUF"),
        file: Some("Phi-4-mini-instruct.Q4_K_M.gguf"),
    },
    Entry {
        id: "smollm3-3b",
        name: "SmolLM3-3B",
        params: "3B",
        quant: "Q4_K_M",
        size_gb: 2.0,
        context_tokens: 128_000,
        score: 79,
        category: ModelCategory::SmallEfficient,
        license: "Apache 2.0",
        description: "HuggingFace's tiny model. Excellent for constrained hardware.",
        tags: &["Tiny", "HuggingFace", "Fast"],
        best_for: "Smallest capable model",
        repo: Some("ggml-org/SmolLM3-3B-GGUF"),
        file: Some("SmolLM3-Q4_K_M.gguf"),
    },
    Entry {
        id: "qwen3-vl-8b",
        name: "Qwen3-VL-8B",
        params: "8B",
        quant: "Q4_K_M",
        size_gb: 5.6,
        context_tokens: 128_000,
        score: 86,
        category: ModelCategory::Vision,
        license: "Apache 2.0",
        description: "Sees and understands images + text. OCR, diagrams, screenshots.",
        tags: &["Vision", "OCR", "Multimodal"],
        best_for: "Best vision model at size",
        repo: Some("Qwen/Qwen3-VL-8B-Instruct-GGUF"),
        file: Some("Qwen3VL-8B-Instruct-Q4_K_M.gguf"),
    },
    Entry {
        id: "functionary-v3.2-8b",
        name: "Functionary-v3.2-8B",
        params: "8B",
        quant: "Q4_K_M",
        size_gb: 4.9,
        context_tokens: 8_000,
        score: 84,
        category: ModelCategory::Agents,
        license: "MIT",
        description: "Purpose-built for function calling and tool use.",
        tags: &["Function Calling", "Tools", "JSON"],
        best_for: "Best tool-use model",
        repo: Some("bartowski/functionary-small-v3.2-GGUF"),
        file: Some("functionary-small-v3.2-Q4_K_M.gguf"),
    },
    Entry {
        id: "dolphin3.0-8b",
        name: "Dolphin3.0-8B",
        params: "8B",
        quant: "Q4_K_M",
        size_gb: 4.9,
        context_tokens: 128_000,
        score: 85,
        category: ModelCategory::Uncensored,
        license: "Llama 3.1",
        description: "Uncensored Llama 3.1. No refusals, helpful for everything.",
        tags: &["Uncensored", "No Refusals", "Llama"],
        best_for: "Best uncensored 8B",
        repo: Some("bartowski/Dolphin3.0-Llama3.1-8B-GGUF"),
        file: Some("Dolphin3.0-Llama3.1-8B-Q4_K_M.gguf"),
    },
    Entry {
        id: "nous-hermes-3-8b",
        name: "Nous-Hermes-3-8B",
        params: "8B",
        quant: "Q4_K_M",
        size_gb: 4.9,
        context_tokens: 128_000,
        score: 84,
        category: ModelCategory::Uncensored,
        license: "Llama 3.1",
        description: "Nous Research uncensored. Structured output, function calling.",
        tags: &["Uncensored", "Structured", "Nous"],
        best_for: "Best uncensored + tools",
        repo: Some("bartowski/Hermes-3-Llama-3.1-8B-GGUF"),
        file: Some("Hermes-3-Llama-3.1-8B-Q4_K_M.gguf"),
    },
    Entry {
        id: "mn-violet-lotus-12b",
        name: "MN-Violet-Lotus-12B",
        params: "12B",
        quant: "Q4_K_M",
        size_gb: 7.7,
        context_tokens: 32_000,
        score: 87,
        category: ModelCategory::Roleplay,
        license: "CC BY-NC",
        description: "Top roleplay model. Rich prose, character consistency, emotional range.",
        tags: &["Roleplay", "Creative", "Prose"],
        best_for: "Best RP model",
        repo: Some("mradermacher/MN-Violet-Lotus-12B-GGUF"),
        file: Some("MN-Violet-Lotus-12B.Q4_K_M.gguf"),
    },
    Entry {
        id: "mythomax-l2-13b",
        name: "MythoMax-L2-13B",
        params: "13B",
        quant: "Q4_K_M",
        size_gb: 7.9,
        context_tokens: 4_000,
        score: 84,
        category: ModelCategory::Roleplay,
        license: "Llama 2",
        description: "Classic RP model. Tried and true community favorite.",
        tags: &["Roleplay", "Classic", "Community"],
        best_for: "Most popular RP model",
        repo: Some("TheBloke/MythoMax-L2-13B-GGUF"),
        file: Some("mythomax-l2-13b.Q4_K_M.gguf"),
    },
    Entry {
        id: "fimbulvetr-11b-v2",
        name: "Fimbulvetr-11B-v2",
        params: "11B",
        quant: "Q4_K_M",
        size_gb: 6.8,
        context_tokens: 8_000,
        score: 85,
        category: ModelCategory::Roleplay,
        license: "Llama 2",
        description: "Norse-themed RP model. Excellent at dark fantasy and adventure.",
        tags: &["Roleplay", "Fantasy", "Adventure"],
        best_for: "Best fantasy RP",
        repo: Some("mradermacher/Fimbulvetr-11B-v2-GGUF"),
        file: Some("Fimbulvetr-11B-v2.Q4_K_M.gguf"),
    },
];

/// Materializes the curated catalog
pub fn curated_models() -> Vec<ModelRecord> {
    ENTRIES
        .iter()
        .map(|e| ModelRecord {
            id: e.id.to_string(),
            name: e.name.to_string(),
            params_label: e.params.to_string(),
            quantization: e.quant.to_string(),
            size_gb: e.size_gb,
            context_tokens: e.context_tokens,
            score: e.score,
            category: e.category,
            license: e.license.to_string(),
            description: e.description.to_string(),
            tags: e.tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            best_for: e.best_for.to_string(),
            source_repo: e.repo.map(str::to_string),
            source_file: e.file.map(str::to_string),
            sha256: None,
        })
        .collect()
}
