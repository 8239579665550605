/// A unit of work that can be invoked repeatedly.
///
/// Every `FnMut(Args) -> R` is an `Operation<Args>`, and so are the middleware
/// adapters ([`RateLimited`](super::RateLimited), [`Retrying`](super::Retrying)),
/// which lets them wrap closures and each other interchangeably. Operations
/// that take several arguments use a tuple; operations that take none use `()`.
pub trait Operation<Args> {
    type Output;

    fn invoke(&mut self, args: Args) -> Self::Output;
}

impl<F, Args, R> Operation<Args> for F
where
    F: FnMut(Args) -> R,
{
    type Output = R;

    fn invoke(&mut self, args: Args) -> R {
        self(args)
    }
}
