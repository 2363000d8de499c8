//! Lua scripts executed atomically on the Redis server

use redis::Script;
use std::sync::LazyLock;

/// Refill and take one token.
///
/// KEYS[1] bucket key; ARGV capacity, refill rate (tokens/sec), now (ms),
/// ttl (ms). Returns `{allowed (0|1), tokens (string)}`. Unreadable state is
/// replaced by a full bucket.
pub(super) static TOKEN_BUCKET: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
local capacity = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local tokens = capacity
local last = now
local raw = redis.call('GET', KEYS[1])
if raw then
  local ok, state = pcall(cjson.decode, raw)
  if ok and type(state) == 'table' and tonumber(state.tokens) and tonumber(state.lastRefill) then
    tokens = tonumber(state.tokens)
    last = tonumber(state.lastRefill)
  end
end

local elapsed = math.max(0, now - last)
tokens = math.min(capacity, tokens + (elapsed / 1000) * rate)

local allowed = 0
if tokens >= 1 then
  tokens = tokens - 1
  allowed = 1
end

redis.call('SET', KEYS[1], cjson.encode({tokens = tokens, lastRefill = now}), 'PX', ttl)
return {allowed, tostring(tokens)}
"#,
    )
});

/// Increment a counter, setting its expiry only when the increment creates it.
///
/// KEYS[1] counter key; ARGV[1] ttl (ms). Returns the new count.
pub(super) static INCREMENT_WINDOW: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#,
    )
});
