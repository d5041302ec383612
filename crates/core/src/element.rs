//! The capability set every schedulable element exposes.

/// Anything a strategy can schedule: a leaf step or a nested group.
///
/// Strategies only ever read these predicates. They never change an
/// element's state.
pub trait Element {
    /// Name, unique within the element's group.
    fn name(&self) -> &str;

    /// Shared resource this element mutates, if any.
    fn asset(&self) -> Option<&str>;

    /// Whether the element has actionable work waiting to be dispatched.
    fn is_pending(&self) -> bool;

    /// Whether the element has finished.
    fn is_complete(&self) -> bool;

    /// Names of sibling elements that must complete before this one.
    fn dependencies(&self) -> &[String] {
        &[]
    }
}

impl<E: Element + ?Sized> Element for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn asset(&self) -> Option<&str> {
        (**self).asset()
    }

    fn is_pending(&self) -> bool {
        (**self).is_pending()
    }

    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }

    fn dependencies(&self) -> &[String] {
        (**self).dependencies()
    }
}
