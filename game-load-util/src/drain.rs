use bytes::Buf;
use hyper::body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Hard cap on a drained body, whatever `Content-Length` the peer sends.
pub const DEFAULT_BODY_LIMIT: usize = 4 * 1024 * 1024;

pin_project! {
    /// Collects every data frame of a body into one buffer, skipping trailers.
    pub struct DrainBodyFuture<B: Body> {
        #[pin]
        body: B,
        buf: Vec<u8>,
        limit: usize,
    }
}

impl<B> DrainBodyFuture<B>
where
    B: Body,
{
    /// `size_hint` only preallocates, the body may still grow up to `limit`.
    #[inline]
    #[must_use]
    pub fn with_limit(body: B, size_hint: usize, limit: usize) -> Self {
        Self {
            body,
            buf: Vec::with_capacity(size_hint.min(limit)),
            limit,
        }
    }
}

impl<B> Future for DrainBodyFuture<B>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Output = Result<Vec<u8>, anyhow::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slf = self.project();
        loop {
            let Some(next_res) = ready!(slf.body.as_mut().poll_frame(cx)) else {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            };
            let frame = match next_res {
                Ok(frame) => frame,
                Err(e) => {
                    return Poll::Ready(Err(
                        anyhow::Error::new(e).context("Failed to poll next body frame")
                    ));
                }
            };
            // Trailers carry no payload.
            let Ok(mut data) = frame.into_data() else {
                continue;
            };
            if slf.buf.len() + data.remaining() > *slf.limit {
                return Poll::Ready(Err(anyhow::anyhow!(
                    "Response body exceeds limit of {} bytes",
                    slf.limit
                )));
            }
            while data.has_remaining() {
                let chunk = data.chunk();
                let len = chunk.len();
                slf.buf.extend_from_slice(chunk);
                data.advance(len);
            }
            if slf.body.is_end_stream() {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            }
        }
    }
}
