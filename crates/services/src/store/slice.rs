/// One resource kind's cached payload plus the lifecycle of operations on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice<T> {
    pub data: T,
    /// A listing or single-item fetch is in flight.
    pub loading: bool,
    /// A mutation (create, submit, update) is in flight.
    pub mutating: bool,
    /// Last failure reason, cleared when the next operation starts or when
    /// the consumer clears it.
    pub error: Option<String>,
}

/// Which in-flight flag an operation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Track {
    Fetch,
    Mutation,
}

impl<T> Slice<T> {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.loading || self.mutating
    }

    pub(crate) fn begin(&mut self, track: Track) {
        *self.flag(track) = true;
        self.error = None;
    }

    pub(crate) fn finish(&mut self, track: Track) {
        *self.flag(track) = false;
    }

    pub(crate) fn fail(&mut self, track: Track, message: String) {
        *self.flag(track) = false;
        self.error = Some(message);
    }

    fn flag(&mut self, track: Track) -> &mut bool {
        match track {
            Track::Fetch => &mut self.loading,
            Track::Mutation => &mut self.mutating,
        }
    }
}
