//! Small helpers shared across the engine

use std::{
    future::Future,
    ops::{Deref, DerefMut},
    pin::Pin,
    task::{Context, Poll},
};

use tokio::task::JoinHandle;

/// Tail-position error conversion, `result.err_into()?` instead of
/// `result.map_err(Into::into)?`
pub trait ErrInto<T, ESource> {
    fn err_into<EDest>(self) -> Result<T, EDest>
    where
        ESource: Into<EDest>;
}

impl<T, ESource> ErrInto<T, ESource> for Result<T, ESource> {
    fn err_into<EDest>(self) -> Result<T, EDest>
    where
        ESource: Into<EDest>,
    {
        self.map_err(|e| e.into())
    }
}

/// A join handle that cancels its task when dropped, so an abandoned
/// background context cannot keep running against a released transport
pub struct OwnedJoinHandle<T>(JoinHandle<T>);

impl<T> OwnedJoinHandle<T> {
    pub fn new(inner: JoinHandle<T>) -> Self {
        Self(inner)
    }
}

impl<T> From<JoinHandle<T>> for OwnedJoinHandle<T> {
    fn from(inner: JoinHandle<T>) -> Self {
        Self::new(inner)
    }
}

impl<T> Deref for OwnedJoinHandle<T> {
    type Target = JoinHandle<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for OwnedJoinHandle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Drop for OwnedJoinHandle<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Future for OwnedJoinHandle<T> {
    type Output = <JoinHandle<T> as Future>::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().0).poll(cx)
    }
}
