// src/any/mutation_stamp.rs
//
// A shared counter/liveness flag that lets an iterator detect, after the
// fact, that the container it was walking has since been mutated or
// dropped. Mirrors the guard object a C++ implementation would heap-
// allocate once per container and hand a raw pointer to: here the "pointer"
// is an `Rc` so the guard outlives the container when an iterator still
// holds one.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct MutationStamp {
    generation: Cell<u64>,
    alive: Cell<bool>,
}

impl MutationStamp {
    pub fn new() -> Rc<Self> {
        Rc::new(Self { generation: Cell::new(0), alive: Cell::new(true) })
    }

    pub fn bump(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn mark_dead(&self) {
        self.alive.set(false);
    }
}
