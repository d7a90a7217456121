use std::cell::OnceCell;

/// A view-model value the render sink may or may not read. The closure
/// runs the first time `get` is called and never again, so widgets like
/// "latest posts" cost nothing on pages whose templates skip them and
/// are computed once on pages that use them several times.
///
/// Request-scoped by construction; requests do not share one.
pub struct Deferred<'a, T> {
    cell: OnceCell<T>,
    init: Box<dyn Fn() -> T + 'a>,
}

impl<'a, T> Deferred<'a, T> {
    pub fn new(init: impl Fn() -> T + 'a) -> Self {
        Deferred {
            cell: OnceCell::new(),
            init: Box::new(init),
        }
    }

    pub fn get(&self) -> &T {
        self.cell.get_or_init(|| (self.init)())
    }

    #[cfg(test)]
    fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }
}
