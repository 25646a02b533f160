//! Post Broadcaster

use tracing::debug;

use crate::models::Post;

use super::hub::Hub;
use super::protocol::ServerEvent;

impl Hub {
    /// Push a freshly created post to every connection, the author's included.
    pub async fn broadcast_new_post(&self, post: Post) -> usize {
        let post_id = post.id.clone();
        let delivered = self.fan_out(&ServerEvent::NewPost { post }, None).await;
        debug!(post_id = %post_id, delivered, "Broadcast new post");
        delivered
    }
}
