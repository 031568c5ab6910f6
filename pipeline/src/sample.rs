use trendcast_core::{posts_to_digest, Post};

/// Number of posts in the offline sample digest.
pub const SAMPLE_POST_COUNT: usize = 20;

const SAMPLE_POSTS: [(&str, &str, i64, u64); SAMPLE_POST_COUNT] = [
    ("MachineLearning", "New benchmark suite exposes contamination in popular eval sets", 2410, 388),
    ("LocalLLaMA", "Running a 70B model on two used 3090s: full setup and throughput numbers", 2152, 301),
    ("OpenAI", "Rumored next-generation model spotted in API model list", 1987, 612),
    ("artificial", "Interpretability paper maps thousands of features in a production model", 1740, 244),
    ("ClaudeAI", "Long-context coding sessions: what actually works after a month", 1603, 219),
    ("StableDiffusion", "Side-by-side comparison of the latest open image models at 1024px", 1521, 276),
    ("singularity", "Survey of researchers shifts median AGI estimate earlier again", 1398, 530),
    ("ChatGPT", "Memory feature rolls out to free tier users", 1276, 187),
    ("deeplearning", "Why state space models still lag on in-context retrieval", 1154, 142),
    ("MachineLearning", "Distillation recipe gets a 3B model within 5 points of the original", 1089, 133),
    ("LocalLLaMA", "Quantization shootout: GGUF vs AWQ vs EXL2 on the same hardware", 1032, 205),
    ("Futurology", "Data center power demand forecast doubles for the next five years", 987, 341),
    ("OpenAI", "Agents API now supports persistent tool sessions", 921, 118),
    ("artificial", "First fines issued under the new AI transparency rules", 876, 264),
    ("ChatGPT", "Voice conversations can now search the web mid-answer", 812, 96),
    ("StableDiffusion", "Consistent characters across a comic page with regional prompting", 768, 84),
    ("MachineLearning", "Mixture-of-experts routing collapse and how to detect it early", 701, 77),
    ("singularity", "Coding assistants now author a third of merged PRs at several large companies", 654, 298),
    ("LocalLLaMA", "Apple silicon inference gets a 40% speedup from new kernels", 603, 69),
    ("deeplearning", "A practical guide to evaluating retrieval-augmented generation", 559, 58),
];

pub fn sample_posts() -> Vec<Post> {
    SAMPLE_POSTS
        .iter()
        .map(|&(channel, title, score, comment_count)| Post {
            title: title.to_string(),
            score,
            comment_count,
            url: String::new(),
            channel: channel.to_string(),
            permalink: String::new(),
        })
        .collect()
}

/// Fixed digest used when forum collection is skipped.
pub fn sample_digest() -> String {
    posts_to_digest(&sample_posts())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_digest_shape() {
        let digest = sample_digest();
        let lines: Vec<_> = digest.lines().collect();

        assert_eq!(lines.len(), SAMPLE_POST_COUNT);
        assert!(lines[0].starts_with("1. [MachineLearning] "));
        assert!(lines[19].starts_with("20. [deeplearning] "));
        assert!(lines[0].ends_with("(Score: 2410, Comments: 388)"));
    }

    #[test]
    fn test_sample_posts_are_ranked() {
        let posts = sample_posts();
        assert!(posts.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }
}
