use bitflags::bitflags;

bitflags! {
    /// Flags on the L0 transport envelope.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct L0Flags: u8 {
        /// Body is ciphertext under the L0 peer's key.
        const ENCRYPTED = 1 << 0;
    }
}

bitflags! {
    /// Flags on the L1 application envelope.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct L1Flags: u8 {
        /// Body is a JSON control or chat message.
        const JSON = 1 << 0;
        /// Body is a file sub-frame.
        const FILE = 1 << 1;
        /// Body is ciphertext under the end-to-end key.
        const ENCRYPTED = 1 << 2;
    }
}
