// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Operators composing streams.
//!
//! Every operator returns a new cold [`Stream`]; subscribing to it subscribes to
//! its sources, and closing its subscription closes theirs.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::error::{SequenceError, StreamError};
use crate::observer::Observer;
use crate::stream::Stream;
use crate::subscription::Subscription;

impl<T: 'static> Stream<T> {
    /// Transform each value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |out: Observer<U>| {
            let f = f.clone();
            let sink = out.clone();
            source.subscribe(out.forward(move |value| sink.next(f(value))))
        })
    }

    /// Keep only the values satisfying `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Self::new(move |out| {
            let predicate = predicate.clone();
            let sink = out.clone();
            source.subscribe(out.forward(move |value| {
                if predicate(&value) {
                    sink.next(value);
                }
            }))
        })
    }

    /// Transform each value, dropping those mapped to `None`.
    pub fn filter_map<U: 'static>(&self, f: impl Fn(T) -> Option<U> + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |out: Observer<U>| {
            let f = f.clone();
            let sink = out.clone();
            source.subscribe(out.forward(move |value| {
                if let Some(mapped) = f(value) {
                    sink.next(mapped);
                }
            }))
        })
    }

    /// Run `f` on each value before passing it on unchanged.
    pub fn inspect(&self, f: impl Fn(&T) + 'static) -> Self {
        self.filter(move |value| {
            f(value);
            true
        })
    }

    /// Interleave the values of every stream in `sources`.
    ///
    /// Completes once all sources have completed; the first error wins.
    pub fn merge(sources: impl IntoIterator<Item = Self>) -> Self {
        let sources: Rc<[Self]> = sources.into_iter().collect::<Vec<_>>().into();
        Self::new(move |out| {
            if sources.is_empty() {
                out.complete();
                return Subscription::closed();
            }
            let sub = Subscription::new();
            let remaining = Rc::new(Cell::new(sources.len()));
            for source in sources.iter() {
                let sink = out.clone();
                let failed = out.clone();
                let done = out.clone();
                let remaining = remaining.clone();
                let observer = Observer::new(move |value| sink.next(value))
                    .with_error(move |err| failed.error(err))
                    .with_complete(move || {
                        remaining.set(remaining.get() - 1);
                        if remaining.get() == 0 {
                            done.complete();
                        }
                    });
                sub.add(source.subscribe(observer));
                if out.is_closed() {
                    break;
                }
            }
            sub
        })
    }

    /// Map each value to a stream and mirror only the most recent one.
    ///
    /// When a new value arrives the previous inner stream is unsubscribed;
    /// late notifications from it are dropped. The result completes once the
    /// source has completed and the current inner stream has completed too.
    pub fn switch_map<U: 'static>(&self, f: impl Fn(T) -> Stream<U> + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |out: Observer<U>| {
            let state = Rc::new(RefCell::new(SwitchState::default()));
            let sub = Subscription::new();
            {
                let state = state.clone();
                sub.add_teardown(move || {
                    let inner = state.borrow_mut().inner.take();
                    if let Some(inner) = inner {
                        inner.unsubscribe();
                    }
                });
            }

            let f = f.clone();
            let on_next = {
                let state = state.clone();
                let out = out.clone();
                move |value: T| {
                    let inner_stream = f(value);
                    let (generation, previous) = {
                        let mut s = state.borrow_mut();
                        s.generation += 1;
                        s.inner_active = true;
                        (s.generation, s.inner.take())
                    };
                    if let Some(previous) = previous {
                        previous.unsubscribe();
                    }
                    let inner_sub = inner_stream.subscribe(inner_observer(&state, &out, generation));
                    let stale = {
                        let mut s = state.borrow_mut();
                        if s.generation != generation {
                            Some(inner_sub)
                        } else {
                            if s.inner_active {
                                s.inner = Some(inner_sub);
                            }
                            None
                        }
                    };
                    if let Some(stale) = stale {
                        stale.unsubscribe();
                    }
                }
            };
            let on_complete = {
                let state = state.clone();
                let out = out.clone();
                move || {
                    let finished = {
                        let mut s = state.borrow_mut();
                        s.outer_done = true;
                        !s.inner_active
                    };
                    if finished {
                        out.complete();
                    }
                }
            };
            let on_error = {
                let out = out.clone();
                move |err| out.error(err)
            };
            let outer = Observer::new(on_next)
                .with_error(on_error)
                .with_complete(on_complete);
            sub.add(source.subscribe(outer));
            sub
        })
    }

    /// Combine the latest value of every stream in `sources`.
    ///
    /// Sources are subscribed in order. Nothing is emitted until each source
    /// has produced a value; afterwards every notification from any source
    /// yields a fresh snapshot. Completes when all sources have completed, or
    /// as soon as one completes without ever producing a value. An empty list
    /// completes immediately.
    pub fn combine_latest(sources: impl IntoIterator<Item = Self>) -> Stream<Vec<T>>
    where
        T: Clone,
    {
        let sources: Rc<[Self]> = sources.into_iter().collect::<Vec<_>>().into();
        Stream::new(move |out: Observer<Vec<T>>| {
            if sources.is_empty() {
                out.complete();
                return Subscription::closed();
            }
            let state = Rc::new(RefCell::new(CombineState {
                values: (0..sources.len()).map(|_| None).collect(),
                missing: sources.len(),
                active: sources.len(),
            }));
            let sub = Subscription::new();
            for (slot, source) in sources.iter().enumerate() {
                let on_next = {
                    let state = state.clone();
                    let out = out.clone();
                    move |value: T| {
                        let snapshot = {
                            let mut s = state.borrow_mut();
                            if s.values[slot].is_none() {
                                s.missing -= 1;
                            }
                            s.values[slot] = Some(value);
                            if s.missing == 0 {
                                s.values.iter().cloned().collect::<Option<Vec<T>>>()
                            } else {
                                None
                            }
                        };
                        if let Some(snapshot) = snapshot {
                            out.next(snapshot);
                        }
                    }
                };
                let on_complete = {
                    let state = state.clone();
                    let out = out.clone();
                    move || {
                        let finished = {
                            let mut s = state.borrow_mut();
                            s.active -= 1;
                            s.active == 0 || s.values[slot].is_none()
                        };
                        if finished {
                            out.complete();
                        }
                    }
                };
                let on_error = {
                    let out = out.clone();
                    move |err| out.error(err)
                };
                let observer = Observer::new(on_next)
                    .with_error(on_error)
                    .with_complete(on_complete);
                sub.add(source.subscribe(observer));
                if out.is_closed() {
                    break;
                }
            }
            sub
        })
    }

    /// Emit only the first `count` values, then complete.
    pub fn take(&self, count: usize) -> Self {
        let source = self.clone();
        Self::new(move |out| {
            if count == 0 {
                out.complete();
                return Subscription::closed();
            }
            let seen = Rc::new(Cell::new(0_usize));
            let sink = out.clone();
            source.subscribe(out.forward(move |value| {
                seen.set(seen.get() + 1);
                sink.next(value);
                if seen.get() >= count {
                    sink.complete();
                }
            }))
        })
    }

    /// Drop the first `count` values.
    pub fn skip(&self, count: usize) -> Self {
        let source = self.clone();
        Self::new(move |out| {
            let seen = Rc::new(Cell::new(0_usize));
            let sink = out.clone();
            source.subscribe(out.forward(move |value| {
                if seen.get() < count {
                    seen.set(seen.get() + 1);
                } else {
                    sink.next(value);
                }
            }))
        })
    }

    /// Emit only the final value, once the source completes.
    ///
    /// Fails with [`SequenceError::Empty`] if the source completes without a value.
    pub fn last(&self) -> Self {
        let source = self.clone();
        Self::new(move |out| {
            let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let store = latest.clone();
            let sink = out.clone();
            let failed = out.clone();
            let observer = Observer::new(move |value| *store.borrow_mut() = Some(value))
                .with_error(move |err| failed.error(err))
                .with_complete(move || {
                    let value = latest.borrow_mut().take();
                    match value {
                        Some(value) => {
                            sink.next(value);
                            sink.complete();
                        }
                        None => sink.error(SequenceError::Empty.shared()),
                    }
                });
            source.subscribe(observer)
        })
    }

    /// Replace an error with the stream returned by `handler`.
    pub fn catch_error(&self, handler: impl Fn(StreamError) -> Self + 'static) -> Self {
        let source = self.clone();
        let handler = Rc::new(handler);
        Self::new(move |out| {
            let sub = Subscription::new();
            let handler = handler.clone();
            let sink = out.clone();
            let done = out.clone();
            let fallback_sub = sub.clone();
            let observer = Observer::new(move |value| sink.next(value))
                .with_complete(move || done.complete())
                .with_error(move |err| {
                    let replacement = handler(err);
                    fallback_sub.add(replacement.subscribe(out.clone()));
                });
            sub.add(source.subscribe(observer));
            sub
        })
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit `value` before the source's own values.
    pub fn start_with(&self, value: T) -> Self {
        let source = self.clone();
        Self::new(move |out| {
            out.next(value.clone());
            source.subscribe(out)
        })
    }

    /// Emit each value paired with its predecessor.
    ///
    /// The first value only primes the pair and is not emitted on its own.
    pub fn pairwise(&self) -> Stream<(T, T)> {
        let source = self.clone();
        Stream::new(move |out: Observer<(T, T)>| {
            let previous: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let sink = out.clone();
            source.subscribe(out.forward(move |value: T| {
                let prior = previous.borrow_mut().replace(value.clone());
                if let Some(prior) = prior {
                    sink.next((prior, value));
                }
            }))
        })
    }
}

#[derive(Default)]
struct SwitchState {
    generation: u64,
    inner: Option<Subscription>,
    inner_active: bool,
    outer_done: bool,
}

struct CombineState<T> {
    values: Vec<Option<T>>,
    missing: usize,
    active: usize,
}

fn inner_observer<U: 'static>(
    state: &Rc<RefCell<SwitchState>>,
    out: &Observer<U>,
    generation: u64,
) -> Observer<U> {
    let on_next = {
        let state = state.clone();
        let out = out.clone();
        move |value| {
            if state.borrow().generation == generation {
                out.next(value);
            }
        }
    };
    let on_error = {
        let state = state.clone();
        let out = out.clone();
        move |err| {
            let current = state.borrow().generation == generation;
            if current {
                out.error(err);
            }
        }
    };
    let on_complete = {
        let state = state.clone();
        let out = out.clone();
        move || {
            let finished = {
                let mut s = state.borrow_mut();
                if s.generation != generation {
                    return;
                }
                s.inner_active = false;
                s.inner = None;
                s.outer_done
            };
            if finished {
                out.complete();
            }
        }
    };
    Observer::new(on_next)
        .with_error(on_error)
        .with_complete(on_complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{collect, manual};
    use alloc::vec;

    #[test]
    fn map_and_filter() {
        let s = Stream::from_values([1, 2, 3, 4])
            .filter(|v| v % 2 == 0)
            .map(|v| v * 10);
        assert_eq!(collect(&s), (vec![20, 40], true));
    }

    #[test]
    fn filter_map_drops_none() {
        let s = Stream::from_values(["1", "x", "3"]).filter_map(|v| v.parse::<u32>().ok());
        assert_eq!(collect(&s).0, [1, 3]);
    }

    #[test]
    fn merge_completes_after_all() {
        let (a, a_obs) = manual::<u8>();
        let s = Stream::merge([a, Stream::of(9)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(false));
        let sink = seen.clone();
        let flag = done.clone();
        s.subscribe(
            Observer::new(move |v| sink.borrow_mut().push(v)).with_complete(move || flag.set(true)),
        );
        assert!(!done.get());
        let a = a_obs.borrow()[0].clone();
        a.next(1);
        a.complete();
        assert_eq!(*seen.borrow(), [9, 1]);
        assert!(done.get());
    }

    #[test]
    fn combine_latest_waits_for_every_slot() {
        let (a, a_obs) = manual::<&str>();
        let (b, b_obs) = manual::<&str>();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        Stream::combine_latest([a, b]).for_each(move |v| sink.borrow_mut().push(v));
        let a = a_obs.borrow()[0].clone();
        let b = b_obs.borrow()[0].clone();
        a.next("a");
        assert!(seen.borrow().is_empty());
        b.next("c");
        a.next("b");
        assert_eq!(*seen.borrow(), [vec!["a", "c"], vec!["b", "c"]]);
    }

    #[test]
    fn combine_latest_of_sync_sources() {
        let s = Stream::combine_latest([Stream::of(1), Stream::of(2)]);
        assert_eq!(collect(&s), (vec![vec![1, 2]], true));
    }

    #[test]
    fn combine_latest_empty_completes() {
        assert_eq!(collect(&Stream::<u8>::combine_latest([])), (vec![], true));
    }

    #[test]
    fn combine_latest_completes_on_silent_source() {
        let s = Stream::combine_latest([Stream::<u8>::empty(), Stream::never()]);
        assert_eq!(collect(&s), (vec![], true));
    }

    #[test]
    fn switch_map_drops_stale_inner() {
        let (outer, outer_obs) = manual::<u8>();
        let inners: Rc<RefCell<Vec<Observer<u8>>>> = Rc::new(RefCell::new(Vec::new()));
        let registry = inners.clone();
        let s = outer.switch_map(move |_| {
            let registry = registry.clone();
            Stream::new(move |out| {
                registry.borrow_mut().push(out);
                Subscription::new()
            })
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.for_each(move |v| sink.borrow_mut().push(v));
        let outer = outer_obs.borrow()[0].clone();
        outer.next(0);
        outer.next(1);
        let first = inners.borrow()[0].clone();
        let second = inners.borrow()[1].clone();
        first.next(10);
        second.next(20);
        assert_eq!(*seen.borrow(), [20]);
        assert!(first.is_closed());
    }

    #[test]
    fn switch_map_completes_after_outer_and_inner() {
        let s = Stream::from_values([1, 2]).switch_map(|v| Stream::from_values([v, v * 10]));
        assert_eq!(collect(&s), (vec![1, 10, 2, 20], true));
    }

    #[test]
    fn switch_map_waits_for_open_inner() {
        let s = Stream::of(1).switch_map(|_| Stream::<u8>::never());
        assert_eq!(collect(&s), (vec![], false));
    }

    #[test]
    fn pairwise_pairs_neighbours() {
        let s = Stream::from_values([1, 2, 3]).pairwise();
        assert_eq!(collect(&s).0, [(1, 2), (2, 3)]);
    }

    #[test]
    fn start_with_prepends() {
        let s = Stream::from_values([2, 3]).start_with(1);
        assert_eq!(collect(&s).0, [1, 2, 3]);
    }

    #[test]
    fn take_skip_last() {
        let s = Stream::from_values([1, 2, 3, 4]);
        assert_eq!(collect(&s.take(2)), (vec![1, 2], true));
        assert_eq!(collect(&s.skip(3)).0, [4]);
        assert_eq!(collect(&s.last()).0, [4]);
    }

    #[test]
    fn last_of_empty_fails() {
        let failed = Rc::new(Cell::new(false));
        let flag = failed.clone();
        Stream::<u8>::empty()
            .last()
            .subscribe(Observer::noop().with_error(move |_| flag.set(true)));
        assert!(failed.get());
    }

    #[test]
    fn catch_error_switches_to_fallback() {
        let s = Stream::<u8>::throw(SequenceError::Empty.shared()).catch_error(|_| Stream::of(5));
        assert_eq!(collect(&s), (vec![5], true));
    }
}
