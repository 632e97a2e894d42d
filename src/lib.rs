#![warn(missing_docs)]
/*! This crate implements an AX.25 v2.2 data-link layer engine: the
framing, addressing, sequencing and retransmission state machine that
sits between a physical radio channel and an application's payload
stream.

# Architecture overview

The [`ax25`] module is the link-layer engine (see [`ax25::Engine`]): it
owns addressing, framing, CRC, sequence numbering, retransmission and
windowing as described by AX.25 v2.2. Its public surface is plain byte
slices and owned buffers, so it can be driven from a KISS/TCP bridge,
from a physical-layer flowgraph, from tests, or from any other harness.

```text
  [ Physical-layer bits ]
           ↓
   [ Bit-stuffing extractor ]   (ax25::bitstream)
           ↓
    [ ax25::Engine ]
           ↓
   [ Application payload ]
```
 */

pub mod ax25;
