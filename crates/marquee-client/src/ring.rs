//! Fixed-capacity ring of recently received messages.

/// Largest message history a marquee face can usefully show.
pub const MAX_RING_CAPACITY: usize = 5;

/// One received message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    payload: Vec<u8>,
}

impl Message {
    /// The message payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Recently received messages, newest first, oldest evicted.
///
/// The client writes, the renderer reads; neither side allocates after
/// construction beyond payload growth inside a reused slot. An "unread"
/// flag is raised on every push and lowered by the renderer after a full
/// pass, so an unchanged ring is never re-reported as news.
#[derive(Debug)]
pub struct MessageRing {
    slots: Vec<Message>,
    head: usize,
    len: usize,
    unread: bool,
}

impl MessageRing {
    /// Create a ring with `capacity` slots, clamped to `1..=MAX_RING_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_RING_CAPACITY);
        MessageRing {
            slots: vec![Message::default(); capacity],
            head: 0,
            len: 0,
            unread: false,
        }
    }

    /// Copy `payload` into the next slot, evicting the oldest message when
    /// the ring is full, and raise the unread flag.
    pub fn push(&mut self, payload: &[u8]) {
        let slot = &mut self.slots[self.head];
        slot.payload.clear();
        slot.payload.extend_from_slice(payload);

        self.head = (self.head + 1) % self.slots.len();
        self.len = (self.len + 1).min(self.slots.len());
        self.unread = true;
    }

    /// Walk the held messages newest first. The iterator borrows the ring;
    /// calling [`MessageRing::iter`] again restarts the walk.
    pub fn iter(&self) -> MessageIter<'_> {
        MessageIter {
            ring: self,
            offset: 0,
        }
    }

    /// Messages currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot count fixed at construction.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True when a push happened since the last [`MessageRing::clear_unread`].
    pub fn has_unread(&self) -> bool {
        self.unread
    }

    /// Lower the unread flag after a rendering pass.
    pub fn clear_unread(&mut self) {
        self.unread = false;
    }
}

/// Newest-first walk over a [`MessageRing`].
#[derive(Debug)]
pub struct MessageIter<'a> {
    ring: &'a MessageRing,
    offset: usize,
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = &'a Message;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.ring.len {
            return None;
        }
        let capacity = self.ring.slots.len();
        let index = (self.ring.head + capacity - 1 - self.offset) % capacity;
        self.offset += 1;
        Some(&self.ring.slots[index])
    }
}
