/// Fixed-capacity circular FIFO with oldest-eviction.
///
/// One slot is kept empty to tell a full queue from an empty one, so a queue
/// created with capacity `N` holds at most `N - 1` elements. The shell uses
/// this for command history; the element type is a parameter so the container
/// stays statically typed.
#[derive(Debug)]
pub struct BoundedFifo<T> {
    slots: Vec<Option<T>>,
    front: usize,
    rear: usize,
}

impl<T> BoundedFifo<T> {
    /// Create a queue with `capacity` slots (`capacity - 1` usable).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            front: 0,
            rear: 0,
        }
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        (self.rear + self.slots.len() - self.front) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.front == self.rear
    }

    pub fn is_full(&self) -> bool {
        (self.rear + 1) % self.slots.len() == self.front
    }

    /// Insert an element, evicting the oldest first when full. Never fails.
    pub fn push(&mut self, item: T) {
        if self.is_full() {
            let _ = self.pop_oldest();
        }
        self.slots[self.rear] = Some(item);
        self.rear = (self.rear + 1) % self.slots.len();
    }

    /// Remove and return the oldest element.
    pub fn pop_oldest(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.front].take();
        self.front = (self.front + 1) % self.slots.len();
        item
    }
}

impl<T: Clone> BoundedFifo<T> {
    /// Ordered copy of the contents, oldest to newest. Independent of
    /// subsequent mutation.
    pub fn snapshot(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        let mut idx = self.front;
        while idx != self.rear {
            if let Some(item) = &self.slots[idx] {
                out.push(item.clone());
            }
            idx = (idx + 1) % self.slots.len();
        }
        out
    }
}
