use crate::types::Post;

/// Flattens collected posts into the ranked plain-text digest fed to the LLM.
pub fn posts_to_digest(posts: &[Post]) -> String {
    posts
        .iter()
        .enumerate()
        .map(|(index, post)| {
            format!(
                "{}. [{}] {} (Score: {}, Comments: {})",
                index + 1,
                post.channel,
                post.title,
                post.score,
                post.comment_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
